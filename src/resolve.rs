//! # Variable Resolution
//!
//! Descriptor values may reference other keys with `%key%` placeholders:
//!
//! ```text
//! name: acme
//! outdir: out/%name%
//! output: %outdir%/%name%.zip
//! ```
//!
//! [`resolve`] expands every placeholder to a fixed point without building a
//! dependency graph. Each key carries an "unresolved" flag. A pass walks the
//! flagged keys in descriptor order and substitutes only references to keys
//! that are already resolved, leaving the rest for a later pass. A key is
//! resolved once all its placeholders were substituted in one pass.
//!
//! An acyclic reference chain of depth D settles in at most D passes. A pass
//! that resolves nothing means the remaining keys reference each other, which
//! is reported as [`Error::CyclicReference`].

use log::{debug, warn};

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};

/// Marker delimiting a placeholder
pub const PLACEHOLDER_MARKER: char = '%';

/// How the resolver reacts to a reference to an undefined key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fail with [`Error::UnknownVariable`].
    #[default]
    Strict,
    /// Legacy behaviour: stop resolving and keep the partially resolved
    /// values. Later steps may then see literal `%key%` text.
    BestEffort,
}

/// Outcome of a resolver run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Number of passes over the flagged keys
    pub passes: usize,
    /// False only when best-effort mode stopped on an unknown variable
    pub complete: bool,
}

/// Expand all `%key%` placeholders in the descriptor in place
pub fn resolve(descriptor: &mut Descriptor, mode: ResolveMode) -> Result<Resolution> {
    let keys: Vec<String> = descriptor.keys().map(str::to_string).collect();
    let entries = descriptor.entries_mut();

    let mut unresolved: Vec<bool> = entries
        .iter()
        .map(|(_, value)| value.contains(PLACEHOLDER_MARKER))
        .collect();

    let max_passes = keys.len() + 1;
    let mut passes = 0;

    while unresolved.iter().any(|flag| *flag) {
        if passes == max_passes {
            return Err(cyclic_reference(&keys, &unresolved, passes));
        }
        passes += 1;
        let mut progressed = false;

        for index in 0..entries.len() {
            if !unresolved[index] {
                continue;
            }

            let value = entries[index].1.clone();
            let spans = placeholder_spans(&keys[index], &value)?;
            let mut substituted = value.clone();
            let mut complete = true;

            for (start, end) in spans.into_iter().rev() {
                let variable = &value[start + 1..end - 1];

                let Some(referenced) = keys.iter().position(|key| key == variable) else {
                    let error = Error::UnknownVariable {
                        key: keys[index].clone(),
                        variable: variable.to_string(),
                    };
                    return match mode {
                        ResolveMode::Strict => Err(error),
                        ResolveMode::BestEffort => {
                            warn!("{}; keeping partially resolved values", error);
                            Ok(Resolution {
                                passes,
                                complete: false,
                            })
                        }
                    };
                };

                if unresolved[referenced] {
                    complete = false;
                    continue;
                }

                let replacement = entries[referenced].1.clone();
                substituted.replace_range(start..end, &replacement);
            }

            entries[index].1 = substituted;
            if complete {
                unresolved[index] = false;
                progressed = true;
            }
        }

        debug!(
            "Resolver pass {}: {} keys still unresolved",
            passes,
            unresolved.iter().filter(|flag| **flag).count()
        );

        if !progressed {
            return Err(cyclic_reference(&keys, &unresolved, passes));
        }
    }

    Ok(Resolution {
        passes,
        complete: true,
    })
}

/// Byte ranges `start..end` of every `%name%` span in a value, including the
/// markers. Markers pair up left to right.
fn placeholder_spans(key: &str, value: &str) -> Result<Vec<(usize, usize)>> {
    let markers: Vec<usize> = value
        .match_indices(PLACEHOLDER_MARKER)
        .map(|(index, _)| index)
        .collect();

    if markers.len() % 2 != 0 {
        return Err(Error::PlaceholderSyntax {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    Ok(markers
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1] + PLACEHOLDER_MARKER.len_utf8()))
        .collect())
}

fn cyclic_reference(keys: &[String], unresolved: &[bool], passes: usize) -> Error {
    Error::CyclicReference {
        keys: keys
            .iter()
            .zip(unresolved)
            .filter(|(_, flag)| **flag)
            .map(|(key, _)| key.clone())
            .collect(),
        passes,
    }
}
