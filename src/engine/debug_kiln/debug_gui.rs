use egui::{Context, Ui, Window};

pub trait DebugGuiBase
{
    // This should be a unique name
    fn name(&self) -> &str;

    fn debug_gui_base(&self, is_active: &mut bool, debug_gui: &Context);
}

pub trait DebugGui
{
    // This should be a unique name
    fn display_name(&self) -> &str;

    fn debug_gui(&self, ui: &mut Ui);
}
impl<T: DebugGui + ?Sized> DebugGuiBase for T
{
    fn name(&self) -> &str { self.display_name() }

    fn debug_gui_base(&self, is_active: &mut bool, debug_gui: &Context)
    {
        Window::new(self.display_name())
            .movable(true)
            .resizable(true)
            .open(is_active)
            .show(debug_gui, |ui| self.debug_gui(ui));
    }
}
