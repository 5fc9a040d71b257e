// SPDX-License-Identifier: Apache-2.0

//! A lock-free, recyclable single-producer single-consumer ring, used to
//! hand cell-level metric reports from a cell executor to the aggregator's
//! control executor without locks or per-report allocation.

pub mod error;
pub mod ring;

pub use error::{RecvError, SendError};
pub use ring::{channel, ReportConsumer, ReportProducer, Recyclable, SlotHandle};
