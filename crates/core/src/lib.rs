//! Murmuration core — generative audio collage composition.
//!
//! Pools short voiced clips by duration bucket, randomly schedules them
//! in time with per-clip stereo placement and loudness shaping, and
//! renders a single mixed-down stereo master.
//!
//! Pipeline: [`collect::collect`] → [`schedule::schedule`] →
//! [`audio::render::render`] → [`compose::export`], wired together by
//! [`compose::compose`].

pub mod audio;
pub mod buckets;
pub mod collect;
pub mod compose;
pub mod schedule;
pub mod types;
