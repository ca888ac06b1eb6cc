/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */

// diff.rs
// Shallow before/after comparison between the observed resource and the
// desired payload. The comparison drives the "is a call needed" decision;
// the resulting Diff is what the operator sees in check mode.

use serde::Serialize;
use serde_json::{Map, Value};

/// Before/after pair restricted to changed keys.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Diff {
    pub before: Map<String, Value>,
    pub after: Map<String, Value>,
}

impl Diff {
    /// An empty diff means the server already matches the desired state.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Key-by-key comparison over the union of both key sets. A key that is
/// present on one side and absent or different on the other lands in
/// `before`/`after`; a key absent on a side is simply left out of that side.
pub fn map_diff(current: &Map<String, Value>, desired: &Map<String, Value>) -> Diff {
    let mut diff = Diff::default();
    for (key, value) in desired {
        if current.get(key) != Some(value) {
            if let Some(old) = current.get(key) {
                diff.before.insert(key.clone(), old.clone());
            }
            diff.after.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in current {
        if !desired.contains_key(key) {
            diff.before.insert(key.clone(), value.clone());
        }
    }
    diff
}

/// The view of the stored resource used for comparison: only the keys the
/// desired payload actually sets. Keys the API adds on its own (id, status,
/// fileName, ...) never count as drift, and an optional the caller left
/// unset compares equal to one the server never stored.
pub fn trimmed_view(current: &Map<String, Value>, desired: &Map<String, Value>) -> Map<String, Value> {
    desired
        .keys()
        .filter_map(|key| current.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}

/// Membership delta between the stored and the desired cluster-group list.
/// Modify calls send targeted add/remove sets instead of replacing the list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupDelta {
    pub add: Vec<i64>,
    pub remove: Vec<i64>,
}

impl GroupDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

pub fn group_delta(current: &[i64], desired: &[i64]) -> GroupDelta {
    GroupDelta {
        add: desired
            .iter()
            .filter(|id| !current.contains(id))
            .copied()
            .collect(),
        remove: current
            .iter()
            .filter(|id| !desired.contains(id))
            .copied()
            .collect(),
    }
}
