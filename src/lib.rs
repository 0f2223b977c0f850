// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A four-voice streaming sample player for percussion modules.
//!
//! Clips are converted once into a compact persisted format, then streamed from
//! storage through small per-voice ring buffers, mixed, and pushed to an output
//! sink one frame at a time.

pub mod audio;
pub mod config;
pub mod controller;
pub mod samples;
pub mod storage;

#[cfg(test)]
mod test;
#[cfg(test)]
mod testutil;
