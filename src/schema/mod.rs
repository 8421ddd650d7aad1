//! Field alias tables and field-name resolution
//!
//! Both structured query languages name dataset columns through an alias
//! table: camelCase for GraphQL, lower-flat for SQL. Names missing from the
//! table fall back to a normalized match against the dataset's own column
//! identifiers.

/// Dataset column identifiers of the voter registration schema
pub mod columns {
    pub const FIRST_NAME: &str = "First Name -MyData";
    pub const LAST_NAME: &str = "Last Name -MyData";
    pub const PHONE: &str = "Phone";
    pub const PHONE_TYPE: &str = "Phone Type";
    pub const LANDLINE_PHONE: &str = "Landline Phone";
    pub const CELL_PHONE: &str = "Cell Phone";
    pub const EMAIL: &str = "Email -MyData";
    pub const ADDRESS: &str = "Address -MyData";
    pub const ADDRESS_LINE_2: &str = "Address Line 2 -MyData";
    pub const CITY: &str = "City -MyData";
    pub const COUNTY: &str = "County";
    pub const STATE: &str = "State -MyData.";
    pub const ZIP: &str = "Zip –MyData";
    pub const REGISTRATION_STATUS: &str = "Registration Status";
    pub const REGISTRATION_DATE: &str = "Registration Date";
    pub const VOTER_STATUS: &str = "Voter Status";
    pub const PARTY: &str = "Party";
    pub const GENDER: &str = "Gender -MyData";
    pub const TOWNSHIP: &str = "Township";
    pub const CONGRESSIONAL_DISTRICTS: &str = "Official Congressional Districts";
    pub const STATE_SENATE_DISTRICTS: &str = "Official State Senate Districts";
    pub const STATE_HOUSE_DISTRICT: &str = "Official State House District";
    pub const UID: &str = "uid";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
}

use columns::*;

/// Immutable mapping from external field names to column identifiers
#[derive(Debug, Clone, Copy)]
pub struct FieldAliasTable {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl FieldAliasTable {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, entries }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact lookup, then case-insensitive lookup
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == field)
            .or_else(|| self.entries.iter().find(|(k, _)| k.eq_ignore_ascii_case(field)))
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    /// First alias that maps onto `column`
    pub fn alias_for(&self, column: &str) -> Option<&'static str> {
        self.iter().find(|(_, target)| *target == column).map(|(alias, _)| alias)
    }
}

pub static GRAPHQL_ALIASES: FieldAliasTable = FieldAliasTable::new(
    "graphql",
    &[
        ("firstName", FIRST_NAME),
        ("lastName", LAST_NAME),
        ("phone", PHONE),
        ("phoneType", PHONE_TYPE),
        ("landlinePhone", LANDLINE_PHONE),
        ("cellPhone", CELL_PHONE),
        ("email", EMAIL),
        ("address", ADDRESS),
        ("addressLine2", ADDRESS_LINE_2),
        ("city", CITY),
        ("county", COUNTY),
        ("state", STATE),
        ("zip", ZIP),
        ("registrationStatus", REGISTRATION_STATUS),
        ("registrationDate", REGISTRATION_DATE),
        ("voterStatus", VOTER_STATUS),
        ("party", PARTY),
        ("gender", GENDER),
        ("township", TOWNSHIP),
        ("officialCongressionalDistricts", CONGRESSIONAL_DISTRICTS),
        ("officialStateSenateDistricts", STATE_SENATE_DISTRICTS),
        ("officialStateHouseDistrict", STATE_HOUSE_DISTRICT),
        ("uid", UID),
    ],
);

pub static SQL_ALIASES: FieldAliasTable = FieldAliasTable::new(
    "sql",
    &[
        ("firstname", FIRST_NAME),
        ("lastname", LAST_NAME),
        ("phone", PHONE),
        ("phonetype", PHONE_TYPE),
        ("landlinephone", LANDLINE_PHONE),
        ("cellphone", CELL_PHONE),
        ("email", EMAIL),
        ("address", ADDRESS),
        ("addressline2", ADDRESS_LINE_2),
        ("city", CITY),
        ("county", COUNTY),
        ("state", STATE),
        ("zip", ZIP),
        ("registrationstatus", REGISTRATION_STATUS),
        ("registrationdate", REGISTRATION_DATE),
        ("voterstatus", VOTER_STATUS),
        ("party", PARTY),
        ("gender", GENDER),
        ("township", TOWNSHIP),
        ("officialcongressionaldistricts", CONGRESSIONAL_DISTRICTS),
        ("officialstatesenatedistricts", STATE_SENATE_DISTRICTS),
        ("officialstatehousedistrict", STATE_HOUSE_DISTRICT),
        ("uid", UID),
    ],
);

/// Lower-case and strip whitespace and hyphens (ASCII and en dash)
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '–')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve a query field name to a dataset column identifier.
///
/// The alias table is consulted first; its target only counts when the
/// dataset actually has that column. Otherwise the normalized name is
/// matched against the normalized dataset columns, first column wins.
pub fn resolve_field<'a>(
    field: &str,
    aliases: &FieldAliasTable,
    columns: &'a [String],
) -> Option<&'a str> {
    if let Some(target) = aliases.get(field) {
        if let Some(col) = columns.iter().find(|c| c.as_str() == target) {
            return Some(col.as_str());
        }
        tracing::debug!(table = aliases.name(), field, target, "alias target not in dataset");
    }

    let wanted = normalize(field);
    if wanted.is_empty() {
        return None;
    }
    columns
        .iter()
        .find(|c| normalize(c) == wanted)
        .map(String::as_str)
}

/// Resolve a list of selection names, dropping unresolvable ones.
/// Falls back to every column when nothing resolves.
pub fn resolve_selection(
    fields: &[String],
    aliases: &FieldAliasTable,
    columns: &[String],
) -> Vec<String> {
    let selected: Vec<String> = fields
        .iter()
        .filter_map(|f| resolve_field(f, aliases, columns))
        .map(str::to_string)
        .collect();
    if selected.is_empty() {
        columns.to_vec()
    } else {
        selected
    }
}

/// The full voter schema, in canonical column order
pub fn voter_columns() -> Vec<String> {
    [
        UID,
        FIRST_NAME,
        LAST_NAME,
        PHONE,
        PHONE_TYPE,
        LANDLINE_PHONE,
        CELL_PHONE,
        EMAIL,
        ADDRESS,
        ADDRESS_LINE_2,
        CITY,
        COUNTY,
        STATE,
        ZIP,
        REGISTRATION_STATUS,
        REGISTRATION_DATE,
        VOTER_STATUS,
        PARTY,
        GENDER,
        TOWNSHIP,
        CONGRESSIONAL_DISTRICTS,
        STATE_SENATE_DISTRICTS,
        STATE_HOUSE_DISTRICT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
