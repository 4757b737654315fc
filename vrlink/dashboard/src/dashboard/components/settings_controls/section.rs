use super::{CompileContext, FormEdit, FormView, NestingInfo, ParentKind, SettingControl};
use eframe::egui::{Grid, ScrollArea, Ui};
use vrlink_session::{Path, SchemaEntry, SchemaNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionLayout {
    // Root of the form, one tab per entry
    Tabs,
    // Top level section, shown as the content of a tab
    TabPage,
    Collapsible,
    // Body of a switch or optional
    Inline,
}

impl SectionLayout {
    pub fn from_nesting(nesting_info: &NestingInfo) -> Self {
        match (nesting_info.depth, nesting_info.parent_kind) {
            (0, _) => SectionLayout::Tabs,
            (1, _) => SectionLayout::TabPage,
            (_, ParentKind::Switch | ParentKind::Optional) => SectionLayout::Inline,
            _ => SectionLayout::Collapsible,
        }
    }
}

struct Entry {
    path: Path,
    advanced: bool,
    special: bool,
    control: SettingControl,
}

pub struct Control {
    nesting_info: NestingInfo,
    layout: SectionLayout,
    entries: Vec<Entry>,
    selected_tab: usize,
    collapsed: bool,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        schema_entries: &[SchemaEntry],
        context: &mut CompileContext,
    ) -> Self {
        let entries = schema_entries
            .iter()
            .map(|entry| {
                let nesting_info = nesting_info
                    .child(entry.name.as_str(), ParentKind::Section)
                    .with_advanced(entry.advanced);

                Entry {
                    path: nesting_info.path.clone(),
                    advanced: nesting_info.advanced,
                    special: matches!(entry.content, SchemaNode::Extension(_)),
                    control: SettingControl::new(nesting_info, &entry.content, context),
                }
            })
            .collect();

        Self {
            layout: SectionLayout::from_nesting(&nesting_info),
            nesting_info,
            entries,
            selected_tab: 0,
            collapsed: true,
        }
    }

    pub fn layout(&self) -> SectionLayout {
        self.layout
    }

    fn entry_visible(entry: &Entry, view: &FormView) -> bool {
        (view.show_advanced || !entry.advanced) && (view.show_special || !entry.special)
    }

    fn tabs_ui(&mut self, ui: &mut Ui, view: &FormView) -> Option<FormEdit> {
        ui.horizontal_wrapped(|ui| {
            for (idx, entry) in self.entries.iter().enumerate() {
                if Self::entry_visible(entry, view)
                    && ui
                        .selectable_label(
                            self.selected_tab == idx,
                            view.translations.setting_name(&entry.path),
                        )
                        .clicked()
                {
                    self.selected_tab = idx;
                }
            }
        });
        ui.separator();

        let entry = self.entries.get_mut(self.selected_tab)?;

        ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Grid::new(entry.path.to_string())
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui| entry.control.ui(ui, view, false))
                    .inner
            })
            .inner
    }

    fn entries_ui(&mut self, ui: &mut Ui, view: &FormView) -> Option<FormEdit> {
        let indentation = self.nesting_info.depth.saturating_sub(1);

        let mut request = None;
        let mut first = true;
        for entry in &mut self.entries {
            if !Self::entry_visible(entry, view) {
                continue;
            }
            if !first {
                ui.end_row();
            }
            first = false;

            super::setting_label(ui, view, &entry.path, indentation);

            request = entry.control.ui(ui, view, true).or(request);
        }

        request
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        match self.layout {
            SectionLayout::Tabs => self.tabs_ui(ui, view),
            SectionLayout::TabPage => self.entries_ui(ui, view),
            SectionLayout::Collapsible => {
                super::grid_flow_inline(ui, allow_inline);

                if (self.collapsed && ui.small_button("Expand").clicked())
                    || (!self.collapsed && ui.small_button("Collapse").clicked())
                {
                    self.collapsed = !self.collapsed;
                }

                if self.collapsed {
                    None
                } else {
                    ui.end_row();
                    self.entries_ui(ui, view)
                }
            }
            SectionLayout::Inline => {
                if allow_inline {
                    ui.end_row();
                }

                self.entries_ui(ui, view)
            }
        }
    }
}
