// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod api_tests;
pub mod health_check;
pub mod helpers;
pub mod repositories;
pub mod result_worker_test;
pub mod timeout_test;
pub mod webhook_test;
