//! Kinematics calibration fingerprinting and checking.

use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};
use tracing::{error, info};
use urprimary_frame::package::{KinematicsInfo, JOINT_COUNT};

use crate::handlers::PackageHandler;

/// Fingerprint of the DH parameters in `info`, as `calib_<16 hex digits>`.
///
/// SHA-256 over the big-endian bytes of theta, a, d and alpha for each
/// joint in turn.
pub fn calibration_hash(info: &KinematicsInfo) -> String {
    let mut hasher = Sha256::new();
    for joint in 0..JOINT_COUNT {
        for value in [
            info.dh_theta[joint],
            info.dh_a[joint],
            info.dh_d[joint],
            info.dh_alpha[joint],
        ] {
            hasher.update(value.to_be_bytes());
        }
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("calib_{}", &digest[..16])
}

/// Compares decoded kinematics against an expected fingerprint.
///
/// Logs an error on mismatch. The check runs on every kinematics package;
/// [`is_checked`](Self::is_checked) turns true after the first one.
#[derive(Debug)]
pub struct CalibrationChecker {
    expected: String,
    checked: AtomicBool,
    matches: AtomicBool,
}

impl CalibrationChecker {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            checked: AtomicBool::new(false),
            matches: AtomicBool::new(false),
        }
    }

    /// The fingerprint this checker expects.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Whether a kinematics package has been checked.
    pub fn is_checked(&self) -> bool {
        self.checked.load(Ordering::Acquire)
    }

    /// Whether the last checked package matched.
    pub fn matches(&self) -> bool {
        self.matches.load(Ordering::Acquire)
    }
}

impl PackageHandler<KinematicsInfo> for CalibrationChecker {
    fn handle(&self, pkg: &KinematicsInfo) {
        let actual = calibration_hash(pkg);
        let matches = actual == self.expected;
        if matches {
            info!(checksum = %actual, "robot calibration matches");
        } else {
            error!(
                expected = %self.expected,
                actual = %actual,
                "robot calibration does not match the expected checksum; \
                 poses may be inaccurate with this kinematics model"
            );
        }
        self.matches.store(matches, Ordering::Release);
        self.checked.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::f64::consts::FRAC_PI_2;

    fn kinematics(offset: f64) -> KinematicsInfo {
        KinematicsInfo {
            checksum: [0; JOINT_COUNT],
            dh_theta: [0.0; JOINT_COUNT],
            dh_a: [0.0, -0.425, -0.3922, 0.0, 0.0, 0.0],
            dh_d: [0.1625 + offset, 0.0, 0.0, 0.1333, 0.0997, 0.0996],
            dh_alpha: [FRAC_PI_2, 0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, 0.0],
            calibration_status: None,
        }
    }

    #[test]
    fn hash_is_stable_and_prefixed() {
        let a = calibration_hash(&kinematics(0.0));
        let b = calibration_hash(&kinematics(0.0));
        assert_eq!(a, b);
        assert!(a.starts_with("calib_"));
        assert_eq!(a.len(), "calib_".len() + 16);
        assert!(a["calib_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_changes_with_parameters() {
        assert_ne!(
            calibration_hash(&kinematics(0.0)),
            calibration_hash(&kinematics(1e-6))
        );
    }

    #[test]
    fn checker_records_result() {
        let expected = calibration_hash(&kinematics(0.0));
        let checker = CalibrationChecker::new(expected.clone());
        assert!(!checker.is_checked());
        assert_eq!(checker.expected(), expected);

        checker.handle(&kinematics(0.0));
        assert!(checker.is_checked());
        assert!(checker.matches());

        checker.handle(&kinematics(0.5));
        assert!(checker.is_checked());
        assert!(!checker.matches());
    }
}
