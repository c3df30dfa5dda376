use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::actions::{Id, ID_LENGTH};

/// Supplier of fresh identifiers for games and player keys.
pub trait IdSource: Send {
    /// Next token, or `None` once the source has nothing left to give.
    fn next_id(&mut self) -> Option<Id>;
}

/// Alphanumeric tokens drawn from a seeded xorshift generator, so a given
/// seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SeededIdSource {
    rng: XorShiftRng,
}

impl SeededIdSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }
}

impl IdSource for SeededIdSource {
    fn next_id(&mut self) -> Option<Id> {
        let token: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(ID_LENGTH)
            .map(char::from)
            .collect();
        Id::parse(&token)
    }
}

/// Replays a fixed list of tokens, then runs dry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedIdSource {
    queue: std::collections::VecDeque<Id>,
}

impl ScriptedIdSource {
    pub fn new<I: IntoIterator<Item = Id>>(ids: I) -> Self {
        Self {
            queue: ids.into_iter().collect(),
        }
    }
}

impl IdSource for ScriptedIdSource {
    fn next_id(&mut self) -> Option<Id> {
        self.queue.pop_front()
    }
}
