/// Sentinels and fixed values shared across pipeline stages.

// Missing-value defaults applied by the cleaner
pub const UNKNOWN_CITY: &str = "Unknown";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const OTHER_REGION: &str = "Other";

// The search API reports every salary in one currency on a yearly basis
pub const SOURCE_NAME: &str = "Adzuna";
pub const SALARY_CURRENCY: &str = "USD";
pub const SALARY_PERIOD: &str = "year";

/// Prefix of the boolean attribute the skill tagger adds per tracked skill.
pub const SKILL_COLUMN_PREFIX: &str = "skill_";

/// Attribute the acquisition client stamps on each job with the search keyword.
pub const CATEGORY_TAG: &str = "_category";

// Output file names inside the configured output directory
pub const CLEAN_CSV_FILE: &str = "clean_jobs.csv";
pub const CLEAN_JSON_FILE: &str = "clean_jobs.json";

// Role-salary aggregation
pub const ROLE_MIN_SAMPLES: usize = 3;
pub const ROLE_TOP_N: usize = 10;
pub const ROLE_TITLE_TOKENS: usize = 2;

// Credentials for the search API come from the environment, never the config file
pub const APP_ID_ENV: &str = "ADZUNA_APP_ID";
pub const APP_KEY_ENV: &str = "ADZUNA_APP_KEY";
