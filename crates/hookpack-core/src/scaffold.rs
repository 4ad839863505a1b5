//! Local hook scaffolding
//!
//! `make` materializes a new hook directory from embedded stub templates,
//! substituting the hook name in kebab, snake, camel and studly casing plus
//! a migration timestamp. The result is immediately installable as a local
//! hook.

use std::path::PathBuf;

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

use crate::config::HooksConfig;
use crate::error::Result;

const COMPOSER_STUB: &str = include_str!("../stubs/composer.json.stub");
const HOOK_STUB: &str = include_str!("../stubs/hook.json.stub");
const SOURCE_STUB: &str = include_str!("../stubs/source.sh.stub");
const MIGRATION_STUB: &str = include_str!("../stubs/migration.sql.stub");
const MIGRATION_DOWN_STUB: &str = include_str!("../stubs/migration.down.sql.stub");
const SEEDER_STUB: &str = include_str!("../stubs/seeder.sql.stub");
const UNSEEDER_STUB: &str = include_str!("../stubs/unseeder.sql.stub");
const ALERT_STUB: &str = include_str!("../stubs/alert.js.stub");

/// Apply the name-derived substitutions to one template.
fn render(template: &str, name: &str, timestamp: &str) -> String {
    template
        .replace("kebab-case", &name.to_kebab_case())
        .replace("snake_case", &name.to_snake_case())
        .replace("camelCase", &name.to_lower_camel_case())
        .replace("StudlyCase", &name.to_upper_camel_case())
        .replace("MIGRATION_DATE_TIME", timestamp)
}

/// Materialize the stub set for a new local hook.
///
/// `timestamp` is the migration prefix in `%Y_%m_%d_%H%M%S` form; callers
/// pass the current time so tests can pin it. Returns the created files.
pub fn make_hook(config: &HooksConfig, name: &str, timestamp: &str) -> Result<Vec<PathBuf>> {
    let root = config.local_hook_dir(name);
    let snake = name.to_snake_case();
    let studly = name.to_upper_camel_case();

    let files = vec![
        (PathBuf::from("composer.json"), COMPOSER_STUB),
        (PathBuf::from("hook.json"), HOOK_STUB),
        (PathBuf::from(format!("src/{snake}.sh")), SOURCE_STUB),
        (
            PathBuf::from(format!(
                "resources/database/migrations/{timestamp}_create_{snake}_table.sql"
            )),
            MIGRATION_STUB,
        ),
        (
            PathBuf::from(format!(
                "resources/database/migrations/{timestamp}_create_{snake}_table.down.sql"
            )),
            MIGRATION_DOWN_STUB,
        ),
        (
            PathBuf::from(format!(
                "resources/database/seeders/{studly}TableSeeder.sql"
            )),
            SEEDER_STUB,
        ),
        (
            PathBuf::from(format!(
                "resources/database/unseeders/{studly}TableUnseeder.sql"
            )),
            UNSEEDER_STUB,
        ),
        (PathBuf::from("resources/assets/scripts/alert.js"), ALERT_STUB),
    ];

    let mut created = Vec::with_capacity(files.len());
    for (relative, template) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render(template, name, timestamp))?;
        created.push(path);
    }
    Ok(created)
}
