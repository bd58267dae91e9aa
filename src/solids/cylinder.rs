//! Z-axis cylinder, diameter from the x extent, height from z.
//!
//! The y extent is ignored.

use nalgebra::Vector3;
use vcad::*;

const SEGMENTS: u32 = 32;

pub fn script(size: &Vector3<f64>) -> String {
    format!(
        "cylinder(h={:.6}, r={:.6}, center=true, $fn={});\n",
        size.z,
        size.x / 2.0,
        SEGMENTS
    )
}

pub fn build(name: &str, size: &Vector3<f64>) -> Part {
    centered_cylinder(name, size.x / 2.0, size.z, SEGMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_uses_radius_and_height() {
        let s = script(&Vector3::new(0.2, 5.0, 1.5));
        assert_eq!(s, "cylinder(h=1.500000, r=0.100000, center=true, $fn=32);\n");
    }
}
