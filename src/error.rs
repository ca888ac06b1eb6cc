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

#[derive(thiserror::Error, Debug)]
pub enum OmevvError {
    #[error("Network error talking to OMEVV console at {url}. {source}")]
    Network { url: String, source: reqwest::Error },

    /// Non-2XX HTTP response carrying the console's JSON error body.
    #[error("OMEVV error {code} at {url}: {message}")]
    Api {
        url: String,
        status_code: u16,
        code: String,
        message: String,
    },

    /// Non-2XX HTTP response without a parseable error body.
    #[error("HTTP {status_code} at {url}. See debug logs for details.")]
    HttpStatus { url: String, status_code: u16 },

    #[error("Could not deserialize response from {url}. Body: {body}. {source}")]
    JsonDeserialize {
        url: String,
        body: String,
        source: serde_json::Error,
    },

    #[error("Could not serialize request body for {url}. Obj: {object_debug}. {source}")]
    JsonSerialize {
        url: String,
        object_debug: String,
        source: serde_json::Error,
    },

    #[error("Required parameters such as: {0}")]
    MissingParameters(String),

    #[error("{0}")]
    Validation(String),
}

impl OmevvError {
    /// Transport-level failures mean the console never saw the request.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, OmevvError::Network { .. })
    }
}
