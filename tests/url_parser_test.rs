//! Tests for URL/ID extraction functionality.

use drive_data::url_parser::extract_id;

mod extract_drive_url {
    use super::*;

    #[test]
    fn folder_url() {
        let url = "https://drive.google.com/drive/folders/1abc123XYZ-_def456";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ-_def456");
    }

    #[test]
    fn folder_url_with_user() {
        let url = "https://drive.google.com/drive/u/0/folders/1abc123XYZ";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ");
    }

    #[test]
    fn file_url_with_view() {
        let url = "https://drive.google.com/file/d/1abc123XYZ/view";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ");
    }

    #[test]
    fn file_url_with_query_params() {
        let url = "https://drive.google.com/file/d/1abc123XYZ/view?usp=sharing";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ");
    }

    #[test]
    fn open_url() {
        let url = "https://drive.google.com/open?id=1abc123XYZ";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ");
    }
}

mod extract_editor_url {
    use super::*;

    #[test]
    fn spreadsheet_url() {
        let url = "https://docs.google.com/spreadsheets/d/1vIICbbfHJ8lYSthiDW/edit";
        assert_eq!(extract_id(url).unwrap(), "1vIICbbfHJ8lYSthiDW");
    }

    #[test]
    fn spreadsheet_url_with_gid_fragment() {
        let url = "https://docs.google.com/spreadsheets/d/1vIICbbfHJ8lYSthiDW/edit#gid=12345";
        assert_eq!(extract_id(url).unwrap(), "1vIICbbfHJ8lYSthiDW");
    }

    #[test]
    fn document_url() {
        let url = "https://docs.google.com/document/d/1lH-Nr_8UBOkvk8Odcd/edit?usp=sharing";
        assert_eq!(extract_id(url).unwrap(), "1lH-Nr_8UBOkvk8Odcd");
    }

    #[test]
    fn presentation_url() {
        let url = "https://docs.google.com/presentation/d/1abc123XYZ/edit";
        assert_eq!(extract_id(url).unwrap(), "1abc123XYZ");
    }
}

mod extract_raw_id {
    use super::*;

    #[test]
    fn alphanumeric_id() {
        assert_eq!(extract_id("1abc123XYZ").unwrap(), "1abc123XYZ");
    }

    #[test]
    fn id_with_underscore_and_hyphen() {
        assert_eq!(extract_id("abc-123_XYZ").unwrap(), "abc-123_XYZ");
    }

    #[test]
    fn id_with_whitespace_trimmed() {
        assert_eq!(extract_id("  1abc123XYZ  ").unwrap(), "1abc123XYZ");
        assert_eq!(extract_id("\t1abc123XYZ\n").unwrap(), "1abc123XYZ");
    }
}

mod invalid_inputs {
    use super::*;

    #[test]
    fn empty_string() {
        assert!(extract_id("").is_err());
    }

    #[test]
    fn whitespace_only() {
        assert!(extract_id("   ").is_err());
        assert!(extract_id("\t\n").is_err());
    }

    #[test]
    fn unrelated_url() {
        assert!(extract_id("https://example.com/folder/123").is_err());
    }

    #[test]
    fn malformed_drive_url() {
        assert!(extract_id("https://drive.google.com/").is_err());
        assert!(extract_id("https://docs.google.com/spreadsheets/").is_err());
    }

    #[test]
    fn invalid_characters_in_id() {
        assert!(extract_id("abc 123").is_err());
        assert!(extract_id("abc/123").is_err());
        assert!(extract_id("abc@123").is_err());
    }
}
