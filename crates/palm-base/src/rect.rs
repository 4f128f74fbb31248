use crate::Vec2;
use std::ops::{Add, Mul, Sub};

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T> {
    pub origin: Vec2<T>,
    pub size: Vec2<T>,
}

impl<T> Rect<T> {
    pub fn new(origin: Vec2<T>, size: Vec2<T>) -> Self {
        Self { origin, size }
    }
}

impl<T: Sub<Output = T> + Copy> Rect<T> {
    pub fn from_min_max(min: Vec2<T>, max: Vec2<T>) -> Self {
        Self {
            origin: min,
            size: max - min,
        }
    }
}

impl<T: Add<Output = T> + Copy> Rect<T> {
    pub fn max(&self) -> Vec2<T> {
        self.origin + self.size
    }
}

impl<T: Mul<Output = T> + Copy> Rect<T> {
    pub fn area(&self) -> T {
        self.size.x * self.size.y
    }
}

impl<T: Add<Output = T> + Sub<Output = T> + PartialOrd + Copy> Rect<T> {
    /// Overlapping part of two rectangles, `None` if they only touch or are disjoint.
    pub fn intersection(&self, other: Rect<T>) -> Option<Rect<T>> {
        let self_max = self.max();
        let other_max = other.max();

        let min = Vec2::new(
            partial_max(self.origin.x, other.origin.x),
            partial_max(self.origin.y, other.origin.y),
        );
        let max = Vec2::new(
            partial_min(self_max.x, other_max.x),
            partial_min(self_max.y, other_max.y),
        );

        if min.x < max.x && min.y < max.y {
            Some(Rect::from_min_max(min, max))
        } else {
            None
        }
    }
}

impl Rect<f32> {
    /// Intersection over union, 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &Rect<f32>) -> f32 {
        if self.size.x <= 0.0 || self.size.y <= 0.0 || other.size.x <= 0.0 || other.size.y <= 0.0 {
            return 0.0;
        }
        let overlap = self.intersection(*other).map_or(0.0, |r| r.area());
        let union = self.area() + other.area() - overlap;
        if union <= 0.0 { 0.0 } else { overlap / union }
    }
}

fn partial_max<T: PartialOrd>(a: T, b: T) -> T {
    if a > b { a } else { b }
}

fn partial_min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b { a } else { b }
}
