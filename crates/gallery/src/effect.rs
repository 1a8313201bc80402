//! Swappable transition effects.
//!
//! Every effect is a fragment body compiled against
//! [`crate::shader::FRAGMENT_PRELUDE`], so they all share one uniform block
//! and the same pair of texture slots. They differ in how the view ray is
//! rotated and how the two slots are blended while `transition` runs 0 to 1.
//! [`Effect::mix_factor`] mirrors each blend curve on the CPU.

use std::f32::consts::{PI, TAU};
use std::fmt;

use crate::shader::assemble_fragment;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Effect {
    /// Fisheye with pointer and direction-aware rotation, soft blend.
    #[default]
    FisheyeBlend,
    /// Fisheye with pointer rotation and a hard switch half way round.
    FisheyeCut,
    /// Fisheye without pointer rotation; single smoothstep blend.
    FisheyeSpin,
    /// Pointer-centred barrel distortion with a centre polar warp.
    PolarWarp,
    /// Lit sphere with equirectangular lookup and GGX highlight.
    Sphere,
    /// User-supplied body written against the shared prelude.
    Custom { body: String },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::FisheyeBlend => "fisheye-blend",
            Effect::FisheyeCut => "fisheye-cut",
            Effect::FisheyeSpin => "fisheye-spin",
            Effect::PolarWarp => "polar-warp",
            Effect::Sphere => "sphere",
            Effect::Custom { .. } => "custom",
        }
    }

    pub fn fragment_source(&self) -> String {
        let body = match self {
            Effect::FisheyeBlend => FISHEYE_BLEND,
            Effect::FisheyeCut => FISHEYE_CUT,
            Effect::FisheyeSpin => FISHEYE_SPIN,
            Effect::PolarWarp => POLAR_WARP,
            Effect::Sphere => SPHERE,
            Effect::Custom { body } => body.as_str(),
        };
        assemble_fragment(body)
    }

    /// Share of the next slot in the output at `progress`, or `None` when the
    /// curve lives only in a custom shader.
    pub fn mix_factor(&self, progress: f32, direction: f32) -> Option<f32> {
        let signed_angle = |dir: f32| progress * TAU * dir;
        let factor = match self {
            Effect::FisheyeBlend | Effect::Sphere => {
                let angle = glsl_mod(signed_angle(direction).abs(), TAU);
                smoothstep(0.1, 0.9, smoothstep(0.0, TAU, angle))
            }
            Effect::FisheyeCut => {
                let angle = glsl_mod(signed_angle(1.0), TAU);
                if angle < PI {
                    0.0
                } else {
                    1.0
                }
            }
            Effect::FisheyeSpin => {
                let angle = glsl_mod(signed_angle(direction).abs(), TAU);
                smoothstep(0.0, TAU, angle)
            }
            Effect::PolarWarp => {
                if progress < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            Effect::Custom { .. } => return None,
        };
        Some(factor)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// GLSL `smoothstep`, including its behaviour for reversed edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

const FISHEYE_BLEND: &str = r"
void main() {
    float aspect = viewportAspect();
    vec2 uv = vec2(v_screen.x * aspect, v_screen.y);
    vec3 dir = fishEye(uv, params.distortion);

    float pointerRotation = (1.0 - params.pointer.x) * PI * 0.25;
    float transitionRotation = params.transition * TAU * params.direction;
    dir = rotateXZ(dir, pointerRotation);
    dir = rotateXZ(dir, transitionRotation);

    vec2 coord = coverUv(dir);
    vec3 currentColor = texture(sampler2D(u_texture, u_texture_sampler), coord).rgb;
    vec3 nextColor = texture(sampler2D(u_texture_next, u_texture_next_sampler), coord).rgb;

    float angle = mod(abs(transitionRotation), TAU);
    float mixFactor = smoothstep(0.1, 0.9, smoothstep(0.0, TAU, angle));
    outColor = vec4(mix(currentColor, nextColor, mixFactor) * vignette(uv), 1.0);
}
";

const FISHEYE_CUT: &str = r"
void main() {
    float aspect = viewportAspect();
    vec2 uv = vec2(v_screen.x * aspect, v_screen.y);
    vec3 dir = fishEye(uv, params.distortion);

    float pointerRotation = (1.0 - params.pointer.x) * PI * 0.25;
    float transitionRotation = params.transition * TAU;
    dir = rotateXZ(dir, pointerRotation);
    dir = rotateXZ(dir, transitionRotation);

    vec2 coord = coverUv(dir);
    vec3 currentColor = texture(sampler2D(u_texture, u_texture_sampler), coord).rgb;
    vec3 nextColor = texture(sampler2D(u_texture_next, u_texture_next_sampler), coord).rgb;

    float angle = mod(transitionRotation, TAU);
    float mixFactor = step(PI, angle);
    outColor = vec4(mix(currentColor, nextColor, mixFactor) * vignette(uv), 1.0);
}
";

const FISHEYE_SPIN: &str = r"
void main() {
    float aspect = viewportAspect();
    vec2 uv = vec2(v_screen.x * aspect, v_screen.y);
    vec3 dir = fishEye(uv, params.distortion);

    float transitionRotation = params.transition * TAU * params.direction;
    dir = rotateXZ(dir, transitionRotation);

    vec2 coord = coverUv(dir);
    vec3 currentColor = texture(sampler2D(u_texture, u_texture_sampler), coord).rgb;
    vec3 nextColor = texture(sampler2D(u_texture_next, u_texture_next_sampler), coord).rgb;

    float angle = mod(abs(transitionRotation), TAU);
    float mixFactor = smoothstep(0.0, TAU, angle);
    outColor = vec4(mix(currentColor, nextColor, mixFactor) * vignette(uv), 1.0);
}
";

const POLAR_WARP: &str = r"
vec2 barrel(vec2 uv, vec2 centre, float strength) {
    vec2 polar = uv - centre;
    float angle = atan(polar.x, polar.y);
    float dist = length(polar);
    dist = dist * (1.0 - strength * dist * dist);
    return centre + vec2(sin(angle), cos(angle)) * dist;
}

void main() {
    float imageAspect = params.image_size.x / max(params.image_size.y, 1.0);
    float canvasAspect = viewportAspect();

    vec2 uv = v_uv;
    if (imageAspect > canvasAspect) {
        float scale = canvasAspect / imageAspect;
        uv = vec2((uv.x - 0.5) * scale + 0.5, uv.y);
    } else {
        float scale = imageAspect / canvasAspect;
        uv = vec2(uv.x, (uv.y - 0.5) * scale + 0.5);
    }

    float strength = sin(clamp(params.transition, 0.0, 1.0) * PI);
    vec2 pointer = vec2(params.pointer.x, 1.0 - params.pointer.y);
    vec2 pointerUv = barrel(uv, pointer, 1.0);
    vec2 warpUv = barrel(uv, vec2(0.5), strength * 2.0);
    vec2 finalUv = mix(pointerUv, warpUv, smoothstep(0.0, 0.2, strength));

    vec4 currentColor = texture(sampler2D(u_texture, u_texture_sampler), finalUv);
    vec4 nextColor = texture(sampler2D(u_texture_next, u_texture_next_sampler), finalUv);
    outColor = vec4(mix(currentColor, nextColor, step(0.5, params.transition)).rgb, 1.0);
}
";

const SPHERE: &str = r"
const vec3 SPHERE_CENTRE = vec3(0.0, 0.0, -10.0);
const float SPHERE_RADIUS = 5.0;
const float ROUGHNESS = 0.35;

float ggxDistribution(float nDotH, float alpha) {
    float a2 = alpha * alpha;
    float denom = nDotH * nDotH * (a2 - 1.0) + 1.0;
    return a2 / max(PI * denom * denom, 1e-6);
}

float smithGeometry(float nDotV, float nDotL, float roughness) {
    float k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    float viewTerm = nDotV / (nDotV * (1.0 - k) + k);
    float lightTerm = nDotL / (nDotL * (1.0 - k) + k);
    return viewTerm * lightTerm;
}

void main() {
    float aspect = viewportAspect();
    vec2 uv = vec2(v_screen.x * aspect, v_screen.y);
    vec3 dir = fishEye(uv, params.distortion);
    float pointerRotation = (1.0 - params.pointer.x) * PI * 0.25;
    float transitionRotation = params.transition * TAU * params.direction;
    vec3 rd = normalize(rotateXZ(dir, pointerRotation));

    float b = dot(rd, SPHERE_CENTRE);
    float c = dot(SPHERE_CENTRE, SPHERE_CENTRE) - SPHERE_RADIUS * SPHERE_RADIUS;
    float h = b * b - c;
    float hit = step(0.0, h);
    float t = b - sqrt(max(h, 0.0));
    vec3 normal = normalize(rd * t - SPHERE_CENTRE);

    vec3 local = rotateXZ(normal, transitionRotation);
    vec2 sphereUv = vec2(
        atan(local.x, local.z) / TAU + 0.5,
        acos(clamp(local.y, -1.0, 1.0)) / PI
    );
    vec2 flatUv = coverUv(rotateXZ(dir, transitionRotation));
    vec2 coord = mix(flatUv, sphereUv, hit);

    vec3 currentColor = texture(sampler2D(u_texture, u_texture_sampler), coord).rgb;
    vec3 nextColor = texture(sampler2D(u_texture_next, u_texture_next_sampler), coord).rgb;
    float angle = mod(abs(transitionRotation), TAU);
    float mixFactor = smoothstep(0.1, 0.9, smoothstep(0.0, TAU, angle));
    vec3 albedo = mix(currentColor, nextColor, mixFactor);

    vec3 lightDir = normalize(vec3(0.5, 0.8, 0.6));
    vec3 viewDir = -rd;
    vec3 halfway = normalize(lightDir + viewDir);
    float nDotL = max(dot(normal, lightDir), 0.0);
    float nDotV = max(dot(normal, viewDir), 1e-4);
    float nDotH = max(dot(normal, halfway), 0.0);
    float vDotH = max(dot(viewDir, halfway), 0.0);

    float alpha = ROUGHNESS * ROUGHNESS;
    float fresnel = 0.04 + 0.96 * pow(1.0 - vDotH, 5.0);
    float specular = ggxDistribution(nDotH, alpha) * smithGeometry(nDotV, nDotL, ROUGHNESS)
        * fresnel / max(4.0 * nDotL * nDotV, 1e-4);
    vec3 lit = albedo * (0.25 + 0.75 * nDotL) + vec3(specular * nDotL);
    vec3 background = albedo * vignette(uv) * 0.35;

    outColor = vec4(mix(background, lit, hit), 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{reflect_program, VERTEX_SHADER};

    const BUILT_IN: [Effect; 5] = [
        Effect::FisheyeBlend,
        Effect::FisheyeCut,
        Effect::FisheyeSpin,
        Effect::PolarWarp,
        Effect::Sphere,
    ];

    #[test]
    fn every_built_in_effect_compiles_and_links() {
        for effect in BUILT_IN {
            if let Err(err) = reflect_program(VERTEX_SHADER, &effect.fragment_source()) {
                panic!("{effect} failed: {err}");
            }
        }
    }

    #[test]
    fn blend_stays_on_current_at_rest_and_reaches_next_late() {
        let effect = Effect::FisheyeBlend;
        assert_eq!(effect.mix_factor(0.0, 1.0), Some(0.0));
        assert!(effect.mix_factor(0.3, 1.0).unwrap() < 0.5);
        assert!((effect.mix_factor(0.5, 1.0).unwrap() - 0.5).abs() < 1e-4);
        assert!(effect.mix_factor(0.95, -1.0).unwrap() > 0.99);
    }

    #[test]
    fn blend_is_symmetric_in_direction() {
        let effect = Effect::FisheyeBlend;
        for step in 0..10 {
            let progress = step as f32 / 10.0;
            let forward = effect.mix_factor(progress, 1.0).unwrap();
            let backward = effect.mix_factor(progress, -1.0).unwrap();
            assert!((forward - backward).abs() < 1e-5);
        }
    }

    #[test]
    fn cut_flips_at_half_turn() {
        let effect = Effect::FisheyeCut;
        assert_eq!(effect.mix_factor(0.49, 1.0), Some(0.0));
        assert_eq!(effect.mix_factor(0.5, 1.0), Some(1.0));
        assert_eq!(effect.mix_factor(0.75, -1.0), Some(1.0));
    }

    #[test]
    fn spin_uses_single_smoothstep() {
        let spin = Effect::FisheyeSpin.mix_factor(0.25, 1.0).unwrap();
        let blend = Effect::FisheyeBlend.mix_factor(0.25, 1.0).unwrap();
        assert!((spin - smoothstep(0.0, 1.0, 0.25)).abs() < 1e-5);
        assert!(blend < spin);
    }

    #[test]
    fn polar_warp_switches_mid_transition() {
        assert_eq!(Effect::PolarWarp.mix_factor(0.4, 1.0), Some(0.0));
        assert_eq!(Effect::PolarWarp.mix_factor(0.6, 1.0), Some(1.0));
    }

    #[test]
    fn custom_body_is_wrapped_with_prelude() {
        let effect = Effect::Custom {
            body: "#version 450\nvoid main() {\n    outColor = texture(sampler2D(u_texture, u_texture_sampler), v_uv) + texture(sampler2D(u_texture_next, u_texture_next_sampler), v_uv) * params.transition;\n}\n".into(),
        };
        assert!(effect.mix_factor(0.5, 1.0).is_none());
        reflect_program(VERTEX_SHADER, &effect.fragment_source()).expect("custom links");
    }

    #[test]
    fn reversed_smoothstep_matches_vignette_falloff() {
        assert_eq!(smoothstep(2.0, 1.6, 1.0), 1.0);
        assert_eq!(smoothstep(2.0, 1.6, 2.5), 0.0);
    }
}
