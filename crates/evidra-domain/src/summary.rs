use evidra_types::{Observation, Outcome};

/// Subject outcome tallies across a set of observations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub pass: u32,
    pub fail: u32,
    pub error: u32,
}

impl OutcomeCounts {
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut counts = OutcomeCounts::default();
        for subject in observations.iter().flat_map(|o| &o.subjects) {
            match subject.result {
                Outcome::Pass => counts.pass += 1,
                Outcome::Fail => counts.fail += 1,
                Outcome::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.pass + self.fail + self.error
    }

    /// True when no subject failed or errored.
    pub fn all_passed(&self) -> bool {
        self.fail == 0 && self.error == 0
    }
}
