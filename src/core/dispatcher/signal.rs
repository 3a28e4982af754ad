// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A manual-reset rendezvous flag used for the four
//! named handoffs between the emulator thread and a render thread:
//! `renderFinished`, `framebufferSwap`, `preSaveSync`, `postLoadSync`.
//! One side calls [`Signal::raise`], the other blocks in
//! [`Signal::wait`] until it observes the flag, consuming it on the way
//! out so the next round needs a fresh raise.

use std::sync::{Condvar, Mutex};

pub struct Signal {
    flag: Mutex<bool>,
    condvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Sets the flag and wakes one waiter.
    pub fn raise(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.condvar.notify_one();
    }

    /// Blocks until the flag is set, then clears it.
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.condvar.wait(flag).unwrap();
        }
        *flag = false;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_blocks_until_raised() {
        let signal = Arc::new(Signal::new());
        let waiter = Arc::clone(&signal);
        let handle = thread::spawn(move || waiter.wait());
        thread::sleep(std::time::Duration::from_millis(20));
        signal.raise();
        handle.join().unwrap();
    }

    #[test]
    fn wait_consumes_the_flag() {
        let signal = Signal::new();
        signal.raise();
        signal.wait();
        assert!(!*signal.flag.lock().unwrap());
    }
}
