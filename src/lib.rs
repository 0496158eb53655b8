// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod bus;
mod codec;
mod config;
mod controller;
mod error;
mod frame;
mod framer;
mod print;
mod queue;
mod scheduler;

pub mod util;

pub use bus::*;
pub use codec::{decode_message, verify_checksum};
pub use config::*;
pub use controller::Controller;
pub use error::*;
pub use frame::*;
pub use framer::*;
pub use print::*;
pub use queue::CommandQueue;
pub use scheduler::Scheduler;
