//! Ordered fallback over candidate locators
//!
//! Each candidate is tried in order. "Not there" is an expected outcome
//! and moves on to the next one; the first hit ends the search; a hard
//! error stops it immediately.

use std::fmt;
use std::future::Future;

/// Outcome of trying one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Found(T),
    Missing,
}

/// Why no candidate produced a value
#[derive(Debug)]
pub enum FallbackError<E> {
    /// Every candidate reported `Missing`
    Exhausted { tried: Vec<String> },
    /// A candidate failed for a reason other than being absent
    Failed { candidate: String, source: E },
}

impl<E: fmt::Display> fmt::Display for FallbackError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { tried } if tried.is_empty() => f.write_str("no candidates to try"),
            Self::Exhausted { tried } => {
                write!(f, "none of the candidates matched: {}", tried.join(", "))
            }
            Self::Failed { candidate, source } => write!(f, "candidate {candidate} failed: {source}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FallbackError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed { source, .. } => Some(source),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Try `candidates` in order and return the first one found, with its value
pub async fn first_available<'a, C, T, E, F, Fut>(
    candidates: &'a [C],
    mut attempt: F,
) -> Result<(&'a C, T), FallbackError<E>>
where
    C: fmt::Display,
    F: FnMut(&'a C) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    let mut tried = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match attempt(candidate).await {
            Ok(Attempt::Found(value)) => return Ok((candidate, value)),
            Ok(Attempt::Missing) => tried.push(candidate.to_string()),
            Err(source) => {
                return Err(FallbackError::Failed {
                    candidate: candidate.to_string(),
                    source,
                })
            }
        }
    }

    Err(FallbackError::Exhausted { tried })
}
