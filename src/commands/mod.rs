// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod exporter;
pub mod goals;
pub mod importer;
pub mod investments;
pub mod networth;
pub mod reconcile;
pub mod recurring;
pub mod reminders;
pub mod transactions;
pub mod transfers;
