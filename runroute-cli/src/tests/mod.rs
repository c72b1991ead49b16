//! Shared test harness modules for the runroute CLI.

use super::*;

mod helpers;
mod plan_unit;
