use crate::channel::Channel;
use crate::slug_map::SlugMap;
use crate::template::Templates;
use crate::view::render_layout;

pub fn render_not_found(channel: &Channel, slug_map: &SlugMap, templates: &Templates) -> String {
    render_layout(templates, channel, slug_map, Some("Not found"), templates.not_found.clone())
}
