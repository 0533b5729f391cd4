use swc_core::{
    ecma::{ast::Program, visit::VisitMutWith},
    plugin::{plugin_transform, proxies::TransformPluginProgramMetadata},
};
use swc_plugin_mobx_flow_transform::{Config, MobxFlowTransform};

#[plugin_transform]
pub fn process_transform(
    mut program: Program,
    metadata: TransformPluginProgramMetadata,
) -> Program {
    let config = Config::from_plugin_config(metadata.get_transform_plugin_config());

    program.visit_mut_with(&mut MobxFlowTransform::new(config));

    program
}
