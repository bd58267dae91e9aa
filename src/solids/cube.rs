//! Centered box sized by the sampled extent.
//!
//! https://en.wikibooks.org/wiki/OpenSCAD_User_Manual/Primitive_Solids#cube

use nalgebra::Vector3;
use vcad::*;

pub fn script(size: &Vector3<f64>) -> String {
    format!(
        "cube([{:.6}, {:.6}, {:.6}], center=true);\n",
        size.x, size.y, size.z
    )
}

pub fn build(name: &str, size: &Vector3<f64>) -> Part {
    centered_cube(name, size.x, size.y, size.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_centered_cube() {
        let s = script(&Vector3::new(0.1, 0.2, 1.0));
        assert_eq!(s, "cube([0.100000, 0.200000, 1.000000], center=true);\n");
    }
}
