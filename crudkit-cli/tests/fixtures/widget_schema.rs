//! Widget resource

use crudkit::prelude::*;

/// Widget records in `widgets`
pub struct Widget;

impl Resource for Widget {
    type Record = Record;
    const NAME: &'static str = "Widget";
    const PATH: &'static str = "widget";
    const TABLE: &'static str = "widgets";
    const ACCESS: AccessTier = AccessTier::Admin;
    const SOFT_DELETE: bool = true;
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
}

/// Stored widget
pub type WidgetRecord = Record;

/// Create input for `widget.create`
pub type CreateWidgetInput = CreateInput;

/// Partial update for `widget.update`
pub type UpdateWidgetData = UpdateData;

/// Page of widgets
pub type WidgetsPage = ListOutput<Record>;
