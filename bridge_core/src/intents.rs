use crate::world::{Direction, Position, WorldAccess};

/// Continuous actions in progress. At most one of each kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StandingIntents {
    walking: Option<Direction>,
    mining: Option<Position>,
}

impl StandingIntents {
    pub fn walking(&self) -> Option<Direction> {
        self.walking
    }

    pub fn mining(&self) -> Option<Position> {
        self.mining
    }

    pub fn set_walking(&mut self, direction: Option<Direction>) {
        self.walking = direction;
    }

    pub fn set_mining(&mut self, target: Option<Position>) {
        self.mining = target;
    }

    pub fn clear(&mut self) {
        self.walking = None;
        self.mining = None;
    }

    pub fn is_idle(&self) -> bool {
        self.walking.is_none() && self.mining.is_none()
    }

    /// Push the intents back into the world. Idempotent.
    pub fn reassert(&self, world: &mut dyn WorldAccess) {
        if let Some(direction) = self.walking {
            world.set_walking(Some(direction));
        }
        if let Some(target) = self.mining {
            world.set_mining(Some(target));
        }
    }
}
