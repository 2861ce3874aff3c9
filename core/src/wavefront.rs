//! Wavefront lane masking

#![allow(dead_code)]

/// Per-lane activity mask for wavefront execution. All lanes advance in
/// lockstep through the bounce loop; a lane that drops out of the mask is
/// frozen for the remainder of the loop and only ever re-read, never
/// re-written.
#[derive(Clone, Debug)]
pub struct LaneMask {
    bits: Vec<bool>,
}

impl LaneMask {
    /// Create a mask with every lane set to the given activity.
    ///
    /// * `lanes`  - Number of lanes.
    /// * `active` - Initial activity.
    pub fn new(lanes: usize, active: bool) -> Self {
        Self {
            bits: vec![active; lanes],
        }
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.bits.len()
    }

    /// True if any lane is still active.
    pub fn any(&self) -> bool {
        self.bits.iter().any(|b| *b)
    }

    /// Number of active lanes.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Activity of one lane.
    ///
    /// * `lane` - The lane.
    pub fn is_active(&self, lane: usize) -> bool {
        self.bits[lane]
    }

    /// Set the activity of one lane.
    ///
    /// * `lane`   - The lane.
    /// * `active` - New activity.
    pub fn set(&mut self, lane: usize, active: bool) {
        self.bits[lane] = active;
    }

    /// Deactivate one lane for the remainder of the loop.
    ///
    /// * `lane` - The lane.
    pub fn deactivate(&mut self, lane: usize) {
        self.bits[lane] = false;
    }

    /// Iterate the indices of active lanes.
    pub fn active_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, b)| if *b { Some(i) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking() {
        let mut mask = LaneMask::new(4, true);
        assert_eq!(mask.count(), 4);
        mask.deactivate(1);
        mask.deactivate(3);
        assert_eq!(mask.active_lanes().collect::<Vec<_>>(), vec![0, 2]);
        mask.deactivate(0);
        mask.deactivate(2);
        assert!(!mask.any());
    }
}
