//! Document verification stub.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ResponseBody, VerificationStatus};

const STATUSES: [VerificationStatus; 3] = [
    VerificationStatus::Verified,
    VerificationStatus::Pending,
    VerificationStatus::Rejected,
];

/// Inclusive range of the numeric part of a verification id.
pub const VERIFICATION_ID_RANGE: std::ops::RangeInclusive<u32> = 1000..=9999;

/// Reports a uniformly random verification status.
#[derive(Debug, Default, Clone)]
pub struct DocumentVerifier;

impl DocumentVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, query: &str) -> ResponseBody {
        self.verify_with(query, &mut rand::thread_rng())
    }

    pub fn verify_with<R: Rng>(&self, query: &str, rng: &mut R) -> ResponseBody {
        let status = *STATUSES.choose(rng).unwrap_or(&VerificationStatus::Pending);
        ResponseBody::DocumentStatus {
            response: format!("The document related to '{}' is currently {}.", query, status),
            status,
            verification_id: format!("VER-{}", rng.gen_range(VERIFICATION_ID_RANGE)),
        }
    }
}
