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

//! A `log` implementation that keeps every message emitted on the current
//! thread, so tests can assert what the library logged.

use log::{LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static LOGGED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct TestLogger;

impl Log for TestLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{}", record.args());
            LOGGED.with(|logged| logged.borrow_mut().push(message));
        }
    }

    fn flush(&self) {}
}

static LOGGER: TestLogger = TestLogger;
static INIT: Once = Once::new();

/// Installs the capturing logger. Safe to call from every test.
pub fn init() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Removes all captured messages of the current thread.
pub fn clear_log_messages() {
    LOGGED.with(|logged| logged.borrow_mut().clear());
}

/// Asserts that `expected` was logged on the current thread and forgets it.
#[track_caller]
pub fn assert_logged(expected: &str) {
    let found = LOGGED.with(|logged| {
        let mut logged = logged.borrow_mut();
        match logged.iter().position(|message| message == expected) {
            Some(position) => {
                logged.remove(position);
                true
            }
            None => false,
        }
    });
    if !found {
        let logged = LOGGED.with(|logged| logged.borrow().clone());
        panic!("Expected log message '{expected}' was not logged. Logged: {logged:?}");
    }
}

/// Asserts that `unexpected` was not logged on the current thread.
#[track_caller]
pub fn assert_not_logged(unexpected: &str) {
    LOGGED.with(|logged| {
        if logged.borrow().iter().any(|message| message == unexpected) {
            panic!("The following log message should not have been logged: '{unexpected}'");
        }
    });
}
