use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("firestore error")]
    Firestore(#[from] crate::client::firestore::Error),
    #[error("memory store error")]
    Memory(#[from] crate::client::memory::Error),
}

/// Displays an error followed by its chain of sources.
pub struct ErrorWithCauses<E>(pub E);

impl<E> fmt::Display for ErrorWithCauses<E>
where
    E: StdError,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut cur: &dyn StdError = &self.0;
        while let Some(next) = cur.source() {
            cur = next;
            write!(f, ": {}", cur)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory;

    #[test]
    fn test_causes_are_chained() {
        let err = Error::from(memory::Error::Unavailable);
        assert_eq!(
            ErrorWithCauses(&err).to_string(),
            "memory store error: store is unavailable"
        );
    }
}
