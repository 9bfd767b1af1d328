use std::fmt;

/// A comparison operator, named the way filter arguments spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Regex,
    IRegex,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    IsNull,
}

impl Lookup {
    pub fn parse(name: &str) -> Option<Lookup> {
        let lookup = match name {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "istartswith" => Lookup::IStartsWith,
            "endswith" => Lookup::EndsWith,
            "iendswith" => Lookup::IEndsWith,
            "regex" => Lookup::Regex,
            "iregex" => Lookup::IRegex,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "in" => Lookup::In,
            "isnull" => Lookup::IsNull,
            _ => return None,
        };

        Some(lookup)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Regex => "regex",
            Lookup::IRegex => "iregex",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::In => "in",
            Lookup::IsNull => "isnull",
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            Lookup::IExact | Lookup::IContains | Lookup::IStartsWith | Lookup::IEndsWith | Lookup::IRegex
        )
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date and time part extraction applied to a column before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Date,
    Time,
    Year,
    IsoYear,
    Quarter,
    Month,
    Week,
    IsoWeekDay,
    WeekDay,
    Day,
    Hour,
    Minute,
    Second,
}

impl DatePart {
    pub fn parse(name: &str) -> Option<DatePart> {
        let part = match name {
            "date" => DatePart::Date,
            "time" => DatePart::Time,
            "year" => DatePart::Year,
            "iso_year" => DatePart::IsoYear,
            "quarter" => DatePart::Quarter,
            "month" => DatePart::Month,
            "week" => DatePart::Week,
            "iso_week_day" => DatePart::IsoWeekDay,
            "week_day" => DatePart::WeekDay,
            "day" => DatePart::Day,
            "hour" => DatePart::Hour,
            "minute" => DatePart::Minute,
            "second" => DatePart::Second,
            _ => return None,
        };

        Some(part)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Date => "date",
            DatePart::Time => "time",
            DatePart::Year => "year",
            DatePart::IsoYear => "iso_year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Week => "week",
            DatePart::IsoWeekDay => "iso_week_day",
            DatePart::WeekDay => "week_day",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
        }
    }

    /// Whether the part yields an integer, as opposed to a date or a time.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, DatePart::Date | DatePart::Time)
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
