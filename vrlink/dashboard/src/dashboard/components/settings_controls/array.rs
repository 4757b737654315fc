use super::{CompileContext, FormEdit, FormView, NestingInfo, ParentKind, SettingControl};
use eframe::egui::Ui;
use vrlink_session::{Path, SchemaNode};

struct Element {
    path: Path,
    control: SettingControl,
}

pub struct Control {
    // Elements sit one level below the array
    indentation: usize,
    elements: Vec<Element>,
    collapsed: bool,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        schema_array: &[SchemaNode],
        context: &mut CompileContext,
    ) -> Self {
        let elements = schema_array
            .iter()
            .enumerate()
            .map(|(idx, schema)| {
                let nesting_info = nesting_info.child(idx, ParentKind::Array);

                Element {
                    path: nesting_info.path.clone(),
                    control: SettingControl::new(nesting_info, schema, context),
                }
            })
            .collect();

        Self {
            indentation: nesting_info.depth,
            elements,
            collapsed: false,
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        if (self.collapsed && ui.small_button("Expand").clicked())
            || (!self.collapsed && ui.small_button("Collapse").clicked())
        {
            self.collapsed = !self.collapsed;
        }

        let mut request = None;
        if !self.collapsed {
            for element in &mut self.elements {
                ui.end_row();

                super::setting_label(ui, view, &element.path, self.indentation);
                request = element.control.ui(ui, view, true).or(request);
            }
        }

        request
    }
}
