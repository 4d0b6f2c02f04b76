use crate::devices::DeviceSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Joined,
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    Unchanged,
    Changed {
        direction: Direction,
        devices: DeviceSet,
    },
}

/// Last known set of devices, replaced wholesale whenever a snapshot differs.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    current: DeviceSet,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &DeviceSet {
        &self.current
    }

    pub fn observe(&mut self, snapshot: DeviceSet) -> ChangeOutcome {
        if snapshot == self.current {
            return ChangeOutcome::Unchanged;
        }

        // Classified by size only: a same-sized swap of members reports as a join.
        let direction = if self.current.len() > snapshot.len() {
            Direction::Left
        } else {
            Direction::Joined
        };

        self.current = snapshot.clone();
        ChangeOutcome::Changed {
            direction,
            devices: snapshot,
        }
    }
}
