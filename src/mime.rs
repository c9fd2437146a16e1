// Copyright (c) 2023 Huawei Device Co., Ltd.
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

use std::path::PathBuf;

/// One field of a multipart form submission.
///
/// A field carries either inline contents or a path to a file whose contents
/// the transfer engine uploads. Mime fields are mutually exclusive with a raw
/// POST body on the same request.
///
/// # Examples
///
/// ```
/// use mux_http_client::MimeField;
///
/// let inline = MimeField::contents("name", "value");
/// let upload = MimeField::file_path("avatar", "/tmp/avatar.png");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MimeField {
    name: String,
    value: MimeValue,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum MimeValue {
    Contents(String),
    FilePath(PathBuf),
}

impl MimeField {
    /// Creates a field whose value is uploaded inline.
    pub fn contents(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MimeValue::Contents(contents.into()),
        }
    }

    /// Creates a field whose value is the contents of a file on disk. The
    /// file is read by the transfer engine when the request runs.
    pub fn file_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            value: MimeValue::FilePath(path.into()),
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn value(&self) -> &MimeValue {
        &self.value
    }
}

#[cfg(test)]
mod ut_mime {
    use super::{MimeField, MimeValue};

    /// UT test cases for `MimeField` constructors.
    ///
    /// # Brief
    /// 1. Creates a contents field and a file path field.
    /// 2. Checks the name and the stored value variant of each.
    #[test]
    fn ut_mime_field_new() {
        let inline = MimeField::contents("a", "b");
        assert_eq!(inline.name(), "a");
        assert_eq!(inline.value(), &MimeValue::Contents(String::from("b")));

        let upload = MimeField::file_path("f", "/tmp/f.bin");
        assert_eq!(upload.name(), "f");
        assert_eq!(
            upload.value(),
            &MimeValue::FilePath(std::path::PathBuf::from("/tmp/f.bin"))
        );
    }
}
