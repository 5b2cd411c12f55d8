//! Application constants for resource ingestion
//!
//! This module contains configuration defaults, column names and wire-level
//! constants used throughout the resource ingest application.

use std::time::Duration;

// =============================================================================
// CSV Layout
// =============================================================================

/// Separator between tokens of a multi-valued column (categories, list enums)
pub const MULTI_VALUE_DELIMITER: char = '+';

/// Separator between the two bounds of a grade range
pub const GRADE_RANGE_DELIMITER: char = '-';

/// Extension of files picked up by directory discovery
pub const CSV_EXTENSION: &str = "csv";

/// Source column encoding both grade bounds (e.g. "K-5")
pub const GRADE_LEVEL_COLUMN: &str = "GRADELEVEL";

/// Extra header names accepted by default beyond the record's own fields
pub const DEFAULT_ALLOWED_EXTRA_FIELDS: &[&str] = &[GRADE_LEVEL_COLUMN];

/// Standard column names of the resource schema
pub mod columns {
    pub const ID: &str = "id";
    pub const BUSINESS_NAME: &str = "businessName";
    pub const STREET_ADDRESS: &str = "streetAddress";
    pub const STATE: &str = "state";
    pub const CITY: &str = "city";
    pub const ZIP_CODE: &str = "zipCode";
    pub const PHONE: &str = "phone";
    pub const WEB_SITE: &str = "webSite";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const SUB_CATEGORY: &str = "subCategory";
    pub const START_GRADE: &str = "startGrade";
    pub const END_GRADE: &str = "endGrade";
    pub const CAREER_INTEREST: &str = "careerInterest";
    pub const COST: &str = "cost";
    pub const INSTRUCTION: &str = "instruction";
    pub const BOARDING: &str = "boarding";
    pub const GENDER: &str = "gender";
    pub const LOCATION_LIMIT: &str = "locationLimit";

    /// Columns every row must carry with a non-blank value
    pub const REQUIRED: &[&str] = &[BUSINESS_NAME, CATEGORY, SUB_CATEGORY];

    /// Free-text columns copied through without vocabulary checks
    pub const SIMPLE_SCALARS: &[&str] =
        &[STREET_ADDRESS, CITY, ZIP_CODE, PHONE, WEB_SITE, DESCRIPTION];
}

// =============================================================================
// Remote API
// =============================================================================

/// Default base URL of the resource directory API
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Endpoint returning every category and subcategory name
pub const CATEGORIES_ENDPOINT: &str = "/category/all";

/// Endpoint creating one resource
pub const RESOURCE_SAVE_ENDPOINT: &str = "/resource/save";

/// Endpoint prefix for deleting one resource by id
pub const RESOURCE_ENDPOINT: &str = "/resource";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Directory that receives rollback-id files, one per upload run
pub const DEFAULT_ROLLBACK_DIR: &str = "rollback_ids";

/// Extension of rollback-id files
pub const ROLLBACK_FILE_EXTENSION: &str = "txt";

// =============================================================================
// Environment Variables
// =============================================================================

/// Overrides the configured API base URL
pub const ENV_API_URL: &str = "RESOURCE_INGEST_API_URL";

/// Overrides the configured rollback directory
pub const ENV_ROLLBACK_DIR: &str = "RESOURCE_INGEST_ROLLBACK_DIR";

/// Application directory name under the user's config directory
pub const CONFIG_DIR_NAME: &str = "resource-ingest";

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Link Checking
// =============================================================================

/// Zero-based index of the link column (the 7th column)
pub const DEFAULT_LINK_COLUMN: usize = 6;

/// Per-request timeout for link probes
pub const LINK_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of links probed at once
pub const DEFAULT_LINK_CHECK_CONCURRENCY: usize = 8;

/// Browser-like user agent; some sites reject unknown clients
pub const LINK_CHECK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36";

/// Status codes at or above this are treated as broken
pub const BROKEN_STATUS_THRESHOLD: u16 = 400;
