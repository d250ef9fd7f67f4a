// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Shared helpers for the `avro-codec` test suites.

use std::fmt::Display;

pub mod logger;

/// An error that panics with the original error as soon as it is created,
/// so the failing `?` location shows up in the test output.
#[derive(Debug)]
pub struct TestError;

impl<E> From<E> for TestError
where
    E: Display,
{
    #[track_caller]
    fn from(error: E) -> Self {
        panic!("{error}")
    }
}

/// The result type for tests that want to use `?`.
pub type TestResult = Result<(), TestError>;

