// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end specs for the analysis dispatch core.

mod prelude;

mod cache;
mod dependencies;
mod naming;
mod renewal;
mod workers;
