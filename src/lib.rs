// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Personal system administration toolkit.
//!
//! Each binary shipped with this crate is a thin command-line front end over
//! one of the modules below: back up a fixed manifest of home directory
//! paths into a gzip compressed tarball, export or restore a password store,
//! purge container resources, clean package caches, and upgrade the system.
//!
//! Everything that talks to an external program goes through the
//! [`Syscall`](syscall::Syscall) seam, so every workflow can be exercised
//! without touching the host.

pub mod backup;
pub mod clean;
pub mod config;
pub mod docker;
pub mod logging;
pub mod passwords;
pub mod path;
pub mod syscall;
pub mod target;
pub mod upgrade;
