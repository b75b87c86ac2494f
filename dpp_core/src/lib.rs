// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core model for the display pre-processor plane pipeline.
//!
//! `dpp_core` turns a compositor's per-plane request into a flat, checked
//! hardware configuration. It is `no_std` compatible (with `alloc`) and has no
//! knowledge of registers; the register layer lives in `dpp_driver`.
//!
//! # Architecture
//!
//! ```text
//!   CompositionRequest ──► flatten() ──► FlatConfig
//!                                            │
//!            Restriction + Capabilities ─────┤
//!                                            ▼
//!                                       validate() ──► ValidatedConfig
//!                                            │               │
//!                                        Rejection        (driver)
//! ```
//!
//! **[`format`]**: static pixel-format catalog with per-format plane size
//! strategies and capability flags.
//!
//! **[`modifier`]**: framebuffer modifiers and the compression they select.
//!
//! **[`restriction`]**: per-channel numeric limits, validated once at attach.
//!
//! **[`request`]**: the composition request and its parts.
//!
//! **[`rotation`]**: DRM rotation encoding and its reduction to the hardware's
//! rotate-90 plus flips.
//!
//! **[`translate`]**: request to [`FlatConfig`](flat::FlatConfig).
//!
//! **[`validate`]**: ordered checks producing a
//! [`ValidatedConfig`](validate::ValidatedConfig) or a
//! [`Rejection`](validate::Rejection).
//!
//! **[`event`]**: hardware-signaled events and channel power states.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod caps;
pub mod event;
pub mod flat;
pub mod format;
pub mod id;
pub mod modifier;
pub mod request;
pub mod restriction;
pub mod rotation;
pub mod trace;
pub mod translate;
pub mod validate;
