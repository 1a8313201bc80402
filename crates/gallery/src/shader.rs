//! GLSL sources shared by every effect plus the CPU half of program building.
//!
//! Each stage is parsed with naga's GLSL front end and validated before any GPU
//! object exists, so compile and link failures can be reported (and tested)
//! without an adapter. Linking checks that the fragment stage only consumes
//! varyings the vertex stage produces and that the resources the renderer
//! binds are all declared.

use std::collections::{BTreeMap, BTreeSet};

use wgpu::naga::{self, ShaderStage};

use crate::error::{GalleryError, ShaderStageKind};

/// Uniform block binding shared by both stages.
pub const PARAMS_BINDING: (u32, u32) = (0, 0);
/// `(group, binding)` pairs of the current/next textures and their samplers.
pub const CURRENT_TEXTURE_BINDING: (u32, u32) = (1, 0);
pub const CURRENT_SAMPLER_BINDING: (u32, u32) = (1, 1);
pub const NEXT_TEXTURE_BINDING: (u32, u32) = (1, 2);
pub const NEXT_SAMPLER_BINDING: (u32, u32) = (1, 3);

const REQUIRED_FRAGMENT_BINDINGS: [((u32, u32), &str); 5] = [
    (PARAMS_BINDING, "GalleryParams uniform block"),
    (CURRENT_TEXTURE_BINDING, "u_texture"),
    (CURRENT_SAMPLER_BINDING, "u_texture_sampler"),
    (NEXT_TEXTURE_BINDING, "u_texture_next"),
    (NEXT_SAMPLER_BINDING, "u_texture_next_sampler"),
];

/// Full-screen quad vertex stage; forwards texcoords and clip-space position.
pub const VERTEX_SHADER: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_texcoord;

layout(location = 0) out vec2 v_uv;
layout(location = 1) out vec2 v_screen;

void main() {
    v_uv = a_texcoord;
    v_screen = a_position;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Declarations and helpers prepended to every effect body.
///
/// The uniform block layout must match [`crate::gpu::GalleryUniforms`].
pub const FRAGMENT_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 1) in vec2 v_screen;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform GalleryParams {
    vec2 resolution;
    vec2 pointer;
    float time;
    float transition;
    float direction;
    float distortion;
    vec2 image_size;
    vec2 padding;
} params;

layout(set = 1, binding = 0) uniform texture2D u_texture;
layout(set = 1, binding = 1) uniform sampler u_texture_sampler;
layout(set = 1, binding = 2) uniform texture2D u_texture_next;
layout(set = 1, binding = 3) uniform sampler u_texture_next_sampler;

#define PI 3.1415926535897932384626433832795
#define TAU 6.283185307179586476925286766559

float viewportAspect() {
    return params.resolution.x / max(params.resolution.y, 1.0);
}

vec3 fishEye(vec2 uv, float level) {
    float len = max(length(uv), 1e-6);
    float a = len * level;
    return vec3(uv / len * sin(a), -cos(a));
}

vec3 rotateXZ(vec3 dir, float angle) {
    float c = cos(angle);
    float s = sin(angle);
    return vec3(c * dir.x + s * dir.z, dir.y, -s * dir.x + c * dir.z);
}

vec2 coverUv(vec3 ray) {
    vec2 base = (ray.xy + 1.0) * 0.5;
    float aspect = viewportAspect();
    if (aspect < 1.0) {
        base = vec2(base.x * aspect + (1.0 - aspect) * 0.5, base.y);
    } else {
        float scale = 1.0 / aspect;
        base = vec2(base.x, base.y * scale + (1.0 - scale) * 0.5);
    }
    return vec2(base.x, 1.0 - base.y);
}

float vignette(vec2 uv) {
    return smoothstep(2.0, 1.6, length(uv)) * 0.15 + 0.85;
}
";

/// Concatenates the prelude with an effect body, dropping any `#version`
/// line the body carries so the prelude's directive stays first.
pub fn assemble_fragment(body: &str) -> String {
    let mut assembled = String::with_capacity(FRAGMENT_PRELUDE.len() + body.len() + 16);
    assembled.push_str(FRAGMENT_PRELUDE);
    assembled.push_str("#line 1\n");
    for line in body.lines() {
        if line.trim_start().starts_with("#version") {
            continue;
        }
        assembled.push_str(line);
        assembled.push('\n');
    }
    assembled
}

/// Resource bindings and varyings discovered by reflecting a compiled program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramBindings {
    resources: BTreeMap<String, (u32, u32)>,
    vertex_outputs: BTreeSet<u32>,
    fragment_inputs: BTreeSet<u32>,
}

impl ProgramBindings {
    /// Looks up the `(group, binding)` of a named resource.
    pub fn resource(&self, name: &str) -> Option<(u32, u32)> {
        self.resources.get(name).copied()
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, (u32, u32))> {
        self.resources
            .iter()
            .map(|(name, binding)| (name.as_str(), *binding))
    }

    pub fn has_binding(&self, binding: (u32, u32)) -> bool {
        self.resources.values().any(|found| *found == binding)
    }

    pub fn vertex_outputs(&self) -> &BTreeSet<u32> {
        &self.vertex_outputs
    }

    pub fn fragment_inputs(&self) -> &BTreeSet<u32> {
        &self.fragment_inputs
    }
}

/// Parses and validates both stages, then checks they link.
pub fn reflect_program(vertex: &str, fragment: &str) -> Result<ProgramBindings, GalleryError> {
    let vertex_module = compile_stage(ShaderStageKind::Vertex, vertex)?;
    let fragment_module = compile_stage(ShaderStageKind::Fragment, fragment)?;

    let mut bindings = ProgramBindings::default();
    for module in [&vertex_module, &fragment_module] {
        for (_, global) in module.global_variables.iter() {
            if let Some(binding) = &global.binding {
                let name = global
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("binding_{}_{}", binding.group, binding.binding));
                bindings
                    .resources
                    .insert(name, (binding.group, binding.binding));
            }
        }
    }
    bindings.vertex_outputs = entry_locations(&vertex_module, LocationKind::Outputs);
    bindings.fragment_inputs = entry_locations(&fragment_module, LocationKind::Inputs);

    let fragment_bindings: BTreeSet<(u32, u32)> = fragment_module
        .global_variables
        .iter()
        .filter_map(|(_, global)| global.binding.as_ref())
        .map(|binding| (binding.group, binding.binding))
        .collect();
    let missing: Vec<String> = REQUIRED_FRAGMENT_BINDINGS
        .iter()
        .filter(|(binding, _)| !fragment_bindings.contains(binding))
        .map(|((group, binding), label)| format!("{label} (set {group}, binding {binding})"))
        .collect();
    if !missing.is_empty() {
        return Err(GalleryError::ShaderLink {
            diagnostics: format!("fragment stage is missing {}", missing.join(", ")),
        });
    }

    let unmatched: Vec<String> = bindings
        .fragment_inputs
        .difference(&bindings.vertex_outputs)
        .map(|location| location.to_string())
        .collect();
    if !unmatched.is_empty() {
        return Err(GalleryError::ShaderLink {
            diagnostics: format!(
                "fragment inputs at location(s) {} are not written by the vertex stage",
                unmatched.join(", ")
            ),
        });
    }

    Ok(bindings)
}

fn compile_stage(stage: ShaderStageKind, source: &str) -> Result<naga::Module, GalleryError> {
    let naga_stage = match stage {
        ShaderStageKind::Vertex => ShaderStage::Vertex,
        ShaderStageKind::Fragment => ShaderStage::Fragment,
    };
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(naga_stage), source)
        .map_err(|errors| GalleryError::ShaderCompile {
            stage,
            diagnostics: errors.emit_to_string(source),
            shader_source: source.to_string(),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|error| GalleryError::ShaderCompile {
        stage,
        diagnostics: error.emit_to_string(source),
        shader_source: source.to_string(),
    })?;

    Ok(module)
}

#[derive(Clone, Copy)]
enum LocationKind {
    Inputs,
    Outputs,
}

fn entry_locations(module: &naga::Module, kind: LocationKind) -> BTreeSet<u32> {
    let mut locations = BTreeSet::new();
    let Some(entry) = module.entry_points.first() else {
        return locations;
    };
    let mut collect = |ty: naga::Handle<naga::Type>, binding: Option<&naga::Binding>| {
        if let Some(naga::Binding::Location { location, .. }) = binding {
            locations.insert(*location);
        } else if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
            for member in members {
                if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                    locations.insert(*location);
                }
            }
        }
    };
    match kind {
        LocationKind::Inputs => {
            for argument in &entry.function.arguments {
                collect(argument.ty, argument.binding.as_ref());
            }
        }
        LocationKind::Outputs => {
            if let Some(result) = &entry.function.result {
                collect(result.ty, result.binding.as_ref());
            }
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSTHROUGH: &str = r"
void main() {
    vec4 current = texture(sampler2D(u_texture, u_texture_sampler), v_uv);
    vec4 next = texture(sampler2D(u_texture_next, u_texture_next_sampler), v_uv);
    outColor = mix(current, next, params.transition);
}
";

    #[test]
    fn assemble_strips_version_from_body() {
        let assembled = assemble_fragment("#version 300 es\nvoid main() {}\n");
        assert_eq!(assembled.matches("#version").count(), 1);
        assert!(assembled.starts_with("#version 450"));
        assert!(assembled.ends_with("void main() {}\n"));
    }

    #[test]
    fn reflects_bindings_and_varyings() {
        let bindings = reflect_program(VERTEX_SHADER, &assemble_fragment(PASSTHROUGH))
            .expect("passthrough program links");
        assert_eq!(bindings.resource("u_texture"), Some(CURRENT_TEXTURE_BINDING));
        assert_eq!(bindings.resource("u_texture_next_sampler"), Some(NEXT_SAMPLER_BINDING));
        assert!(bindings.has_binding(PARAMS_BINDING));
        assert!(bindings.vertex_outputs().contains(&0));
        assert!(bindings
            .fragment_inputs()
            .is_subset(bindings.vertex_outputs()));
    }

    #[test]
    fn syntax_error_is_a_compile_error_with_source() {
        let fragment = assemble_fragment("void main() { outColor = vec4(1.0) }\n");
        match reflect_program(VERTEX_SHADER, &fragment) {
            Err(GalleryError::ShaderCompile {
                stage,
                diagnostics,
                shader_source,
            }) => {
                assert_eq!(stage, ShaderStageKind::Fragment);
                assert!(!diagnostics.is_empty());
                assert_eq!(shader_source, fragment);
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn broken_vertex_stage_is_reported_as_vertex() {
        let err = reflect_program("#version 450\nvoid main() { gl_Position = 1; }\n", "")
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::ShaderCompile {
                stage: ShaderStageKind::Vertex,
                ..
            }
        ));
    }

    #[test]
    fn unmatched_varying_is_a_link_error() {
        let fragment = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 5) in vec2 v_extra;
layout(location = 0) out vec4 outColor;
layout(std140, set = 0, binding = 0) uniform GalleryParams { vec2 resolution; } params;
layout(set = 1, binding = 0) uniform texture2D u_texture;
layout(set = 1, binding = 1) uniform sampler u_texture_sampler;
layout(set = 1, binding = 2) uniform texture2D u_texture_next;
layout(set = 1, binding = 3) uniform sampler u_texture_next_sampler;
void main() {
    outColor = texture(sampler2D(u_texture, u_texture_sampler), v_uv + v_extra);
    outColor += texture(sampler2D(u_texture_next, u_texture_next_sampler), v_uv) * params.resolution.x;
}
";
        let err = reflect_program(VERTEX_SHADER, fragment).unwrap_err();
        assert!(matches!(err, GalleryError::ShaderLink { .. }), "{err:?}");
    }

    #[test]
    fn missing_texture_binding_is_a_link_error() {
        let fragment = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;
void main() {
    outColor = vec4(v_uv, 0.0, 1.0);
}
";
        let err = reflect_program(VERTEX_SHADER, fragment).unwrap_err();
        match err {
            GalleryError::ShaderLink { diagnostics } => {
                assert!(diagnostics.contains("u_texture"));
            }
            other => panic!("expected link error, got {other:?}"),
        }
    }
}
