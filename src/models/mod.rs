// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Domain layer: pure data types shared between the UI and the API client.

pub mod field;
pub mod grouping;
pub mod options;
pub mod pagination;
pub mod progress;
pub mod record;
pub mod selection;
