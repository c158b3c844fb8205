//! Single-operator password check

use sha2::{Digest, Sha256};
use std::fmt;
use tracing::warn;

/// Verifies the operator password
///
/// Only the SHA-256 digest of the configured password is kept. Candidates
/// are hashed and compared in constant time, so neither the length nor the
/// content of the secret leaks through timing. A gate built without a
/// password rejects everything.
#[derive(Clone)]
pub struct OperatorGate {
    digest: Option<[u8; 32]>,
}

impl OperatorGate {
    pub fn new(password: Option<&str>) -> Self {
        let digest = password.filter(|p| !p.is_empty()).map(Self::hash);
        if digest.is_none() {
            warn!("No operator password configured; every login will be rejected");
        }
        Self { digest }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match &self.digest {
            Some(expected) => constant_time_eq(expected, &Self::hash(candidate)),
            None => false,
        }
    }

    fn hash(value: &str) -> [u8; 32] {
        Sha256::digest(value.as_bytes()).into()
    }
}

impl fmt::Debug for OperatorGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_matching_password() {
        let gate = OperatorGate::new(Some("correct horse"));

        assert!(gate.is_configured());
        assert!(gate.verify("correct horse"));
        assert!(!gate.verify("correct horse "));
        assert!(!gate.verify(""));
    }

    #[test]
    fn test_unset_password_rejects_everything() {
        for gate in [OperatorGate::new(None), OperatorGate::new(Some(""))] {
            assert!(!gate.is_configured());
            assert!(!gate.verify(""));
            assert!(!gate.verify("anything"));
        }
    }

    #[test]
    fn test_debug_hides_digest() {
        let debug = format!("{:?}", OperatorGate::new(Some("pw")));
        assert_eq!(debug, "OperatorGate { configured: true }");
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [7u8; 32];
        let mut b = a;
        assert!(constant_time_eq(&a, &b));
        b[31] = 8;
        assert!(!constant_time_eq(&a, &b));
    }
}
