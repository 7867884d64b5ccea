use crate::node::{accessors, namespace_view};

namespace_view! {
    /// IPTC-IIM application record (record 2) datasets.
    MetadataIptc
}

impl MetadataIptc {
    accessors! {
        get object_name, set set_object_name: String = "ObjectName";
        get urgency: String = "Urgency";
        get category: String = "Category";
        get keywords, set set_keywords: Vec<String> = "Keywords";
        get special_instructions, set set_special_instructions: String = "SpecialInstructions";
        /// `CCYYMMDD`.
        get date_created, set set_date_created: String = "DateCreated";
        /// `HHMMSS±HHMM`.
        get time_created, set set_time_created: String = "TimeCreated";
        get byline, set set_byline: Vec<String> = "Byline";
        get byline_title: String = "BylineTitle";
        get city, set set_city: String = "City";
        get sub_location, set set_sub_location: String = "SubLocation";
        get province_state, set set_province_state: String = "Province/State";
        get country_code: String = "Country/PrimaryLocationCode";
        get country, set set_country: String = "Country/PrimaryLocationName";
        get headline, set set_headline: String = "Headline";
        get credit, set set_credit: String = "Credit";
        get source, set set_source: String = "Source";
        get copyright_notice, set set_copyright_notice: String = "CopyrightNotice";
        get caption, set set_caption: String = "Caption/Abstract";
        get writer_editor, set set_writer_editor: String = "Writer/Editor";
    }
}
