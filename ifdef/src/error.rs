// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A conditional expression on a directive line did not parse.
    #[error("line {line}: cannot parse conditional expression: {message}")]
    Expr { line: usize, message: String },

    /// A saved stats table did not match the `<size> <token>` format.
    #[error("line {line}: malformed stats entry: {message}")]
    Stats { line: usize, message: String },

    #[error("error processing io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
