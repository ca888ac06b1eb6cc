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
pub mod model;

pub mod baseline;
pub mod diff;
mod error;
pub mod firmware;
pub mod network;
pub mod poll;
pub mod reconcile;

pub use baseline::{apply_baseline_profile, BaselineProfileConfig, BaselineProfiles};
pub use diff::{Diff, GroupDelta};
pub use error::OmevvError;
pub use firmware::{apply_firmware_repository, FirmwareProfiles, FirmwareRepositoryConfig};
pub use model::{
    BaselineProfile, DesiredState, FirmwareRepositoryProfile, JobSchedule, ProfileStatus,
    ProtocolType, ShareCredential,
};
pub use network::{
    Endpoint, Method, OmevvClientPool, OmevvClientPoolBuilder, OmevvHttpClient, Response,
    RestClient, OMEVV_ENDPOINT,
};
pub use poll::{PollOutcome, PollPolicy};
pub use reconcile::OperationReport;
