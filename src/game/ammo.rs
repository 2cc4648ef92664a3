// Ammunition bookkeeping

use serde::{Deserialize, Serialize};

use super::entity::ProjectileKind;

/// Count per projectile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmmoCount {
    pub rock: u32,
    pub bomb: u32,
}

impl AmmoCount {
    pub const fn new(rock: u32, bomb: u32) -> Self {
        Self { rock, bomb }
    }

    pub fn get(&self, kind: ProjectileKind) -> u32 {
        match kind {
            ProjectileKind::Rock => self.rock,
            ProjectileKind::Bomb => self.bomb,
        }
    }

    fn get_mut(&mut self, kind: ProjectileKind) -> &mut u32 {
        match kind {
            ProjectileKind::Rock => &mut self.rock,
            ProjectileKind::Bomb => &mut self.bomb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rock == 0 && self.bomb == 0
    }
}

/// Remaining and used ammo for one level
///
/// `remaining + used == initial` for each kind at all times; only
/// [`AmmoCounter::try_consume`] moves a round from one side to the other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AmmoCounter {
    remaining: AmmoCount,
    used: AmmoCount,
}

impl AmmoCounter {
    pub fn new(initial: AmmoCount) -> Self {
        Self {
            remaining: initial,
            used: AmmoCount::default(),
        }
    }

    pub fn remaining(&self, kind: ProjectileKind) -> u32 {
        self.remaining.get(kind)
    }

    pub fn used(&self, kind: ProjectileKind) -> u32 {
        self.used.get(kind)
    }

    pub fn remaining_counts(&self) -> AmmoCount {
        self.remaining
    }

    pub fn used_counts(&self) -> AmmoCount {
        self.used
    }

    /// Take one round of `kind`; false if none are left
    pub fn try_consume(&mut self, kind: ProjectileKind) -> bool {
        let remaining = self.remaining.get_mut(kind);
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        *self.used.get_mut(kind) += 1;
        true
    }

    /// Both kinds are empty
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_invariant(ammo: &AmmoCounter, initial: AmmoCount) {
        for kind in [ProjectileKind::Rock, ProjectileKind::Bomb] {
            assert_eq!(ammo.remaining(kind) + ammo.used(kind), initial.get(kind));
        }
    }

    #[test]
    fn test_consume_until_empty() {
        let initial = AmmoCount::new(2, 1);
        let mut ammo = AmmoCounter::new(initial);

        assert!(ammo.try_consume(ProjectileKind::Rock));
        assert!(ammo.try_consume(ProjectileKind::Rock));
        assert!(!ammo.try_consume(ProjectileKind::Rock));
        check_invariant(&ammo, initial);
        assert_eq!(ammo.used(ProjectileKind::Rock), 2);
        assert!(!ammo.is_exhausted());

        assert!(ammo.try_consume(ProjectileKind::Bomb));
        assert!(!ammo.try_consume(ProjectileKind::Bomb));
        assert!(ammo.is_exhausted());
        check_invariant(&ammo, initial);
    }

    #[test]
    fn test_counts_are_monotonic() {
        let initial = AmmoCount::new(3, 3);
        let mut ammo = AmmoCounter::new(initial);
        let kinds = [
            ProjectileKind::Bomb,
            ProjectileKind::Rock,
            ProjectileKind::Bomb,
            ProjectileKind::Bomb,
            ProjectileKind::Bomb,
        ];

        let mut last = ammo.remaining_counts();
        for kind in kinds {
            ammo.try_consume(kind);
            let now = ammo.remaining_counts();
            assert!(now.rock <= last.rock && now.bomb <= last.bomb);
            check_invariant(&ammo, initial);
            last = now;
        }
        assert_eq!(ammo.used_counts(), AmmoCount::new(1, 3));
    }

    #[test]
    fn test_empty_level_is_exhausted() {
        assert!(AmmoCounter::new(AmmoCount::default()).is_exhausted());
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let initial = AmmoCount::new(u32::MAX, u32::MAX);
        let mut ammo = AmmoCounter::new(initial);
        assert!(!ammo.is_exhausted());

        assert!(ammo.try_consume(ProjectileKind::Bomb));
        assert!(!ammo.is_exhausted());
        check_invariant(&ammo, initial);
    }
}
