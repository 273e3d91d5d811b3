/// Physical stress tensor in Voigt order `(xx, yy, zz, yz, xz, xy)`.
///
/// CFG files never store this quantity directly. Their `PlusStress` record holds the
/// volume-scaled, sign-flipped tensor (`-stress * volume`), which [`Stress::to_wire`]
/// and [`Stress::from_wire`] convert to and from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stress(pub [f64; 6]);

impl Stress {
    /// Component labels in storage order, as they appear in the `PlusStress` header.
    pub const COMPONENTS: [&'static str; 6] = ["xx", "yy", "zz", "yz", "xz", "xy"];

    pub fn new(voigt: [f64; 6]) -> Self {
        Self(voigt)
    }

    #[inline]
    pub fn components(&self) -> [f64; 6] {
        self.0
    }

    /// Converts to the `PlusStress` wire quantity for a cell of the given volume.
    pub fn to_wire(&self, volume: f64) -> [f64; 6] {
        self.0.map(|s| -s * volume)
    }

    /// Recovers the physical stress from a `PlusStress` record.
    pub fn from_wire(wire: [f64; 6], volume: f64) -> Self {
        Self(wire.map(|w| -w / volume))
    }
}

impl From<[f64; 6]> for Stress {
    fn from(voigt: [f64; 6]) -> Self {
        Self(voigt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn wire_conversion_flips_sign_and_scales_by_volume() {
        let stress = Stress::new([1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let wire = stress.to_wire(27.0);
        assert_eq!(wire[..3], [-27.0, -27.0, -27.0]);
        assert!(wire[3..].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn from_wire_inverts_to_wire() {
        let stress = Stress::new([0.5, -1.25, 3.0, 0.1, -0.2, 0.3]);
        let back = Stress::from_wire(stress.to_wire(41.7), 41.7);
        for (a, b) in stress.components().iter().zip(back.components().iter()) {
            assert!(approx_eq(*a, *b, 1e-12));
        }
    }

    #[test]
    fn component_labels_follow_voigt_order() {
        assert_eq!(Stress::COMPONENTS.join(" "), "xx yy zz yz xz xy");
    }
}
