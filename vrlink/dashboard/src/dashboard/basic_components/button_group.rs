use eframe::egui::Ui;

// options: (id, label) pairs
pub fn button_group_clicked(ui: &mut Ui, options: &[(String, String)], selection: &mut String) -> bool {
    let mut clicked = false;
    for (id, label) in options {
        if ui
            .selectable_label(selection == id, label)
            .clicked()
        {
            selection.clone_from(id);
            clicked = true;
        }
    }

    clicked
}
