//! Category → visual treatment and alarm policy.

use crate::types::Category;
use image::Rgb;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// How a recognized face is drawn, and whether it raises the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Treatment {
    pub color: Rgb<u8>,
    pub alarm: bool,
}

impl Category {
    pub fn treatment(self) -> Treatment {
        match self {
            Category::Threat => Treatment {
                color: RED,
                alarm: true,
            },
            Category::NonThreat => Treatment {
                color: GREEN,
                alarm: false,
            },
            Category::Unknown => Treatment {
                color: BLUE,
                alarm: false,
            },
        }
    }
}
