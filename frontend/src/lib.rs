use seed::{prelude::*, virtual_dom::AtValue, *};
use serde::Deserialize;
use serde_wasm_bindgen::to_value;
use shared::{
    costing, geometry, Coordinate, LaneId, LaneRegistry, LaneSnapshot, MarkerId, PropulsionType,
    RouteRequest,
};
use wasm_bindgen::{
    prelude::{wasm_bindgen, JsValue},
    JsCast,
};

#[wasm_bindgen(module = "/leaflet_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map();
    #[wasm_bindgen(js_name = addWaypointMarker)]
    fn add_waypoint_marker(lat: f64, lng: f64);
    #[wasm_bindgen(js_name = clearWaypointMarkers)]
    fn clear_waypoint_markers();
    #[wasm_bindgen(js_name = drawLanePolyline)]
    fn draw_lane_polyline(lane_key: &str, coords: JsValue);
    #[wasm_bindgen(js_name = placeBusMarker)]
    fn place_bus_marker(layer_key: &str, css_class: &str, lat: f64, lng: f64, color: &str);
    #[wasm_bindgen(js_name = removeBusMarker)]
    fn remove_bus_marker(layer_key: &str);
    #[wasm_bindgen(js_name = clearMapLayers)]
    fn clear_map_layers();
    #[wasm_bindgen(js_name = fitLaneBounds)]
    fn fit_lane_bounds(coords: JsValue);
}

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:8080".to_string()
}

/// Key the map glue uses for its layer-handle table. Prefixing the lane id
/// keeps markers of duplicate service codes apart; the css class half stays
/// the `busIcon-…` identifier the icon itself carries.
fn layer_key(lane: LaneId, marker: &MarkerId) -> String {
    format!("{}:{}", lane, marker.css_class())
}

pub struct Model {
    form: LaneForm,
    waypoints: Vec<Coordinate>,
    registry: LaneRegistry,
    pending: bool,
    error: Option<String>,
}

#[derive(Default, Clone)]
struct LaneForm {
    line: String,
    origin: String,
    destination: String,
    service_code: String,
    /// Service code used by the cache/seed load buttons.
    load_code: String,
}

impl LaneForm {
    fn to_request(&self, waypoints: &[Coordinate]) -> Result<RouteRequest, String> {
        if self.service_code.trim().is_empty() {
            return Err("A service code is required".to_string());
        }
        if waypoints.len() < 2 {
            return Err(format!(
                "At least two waypoints are required, got {}",
                waypoints.len()
            ));
        }
        let optional = |field: &str| {
            let trimmed = field.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Ok(RouteRequest {
            waypoints: waypoints.to_vec(),
            service_code: self.service_code.trim().to_string(),
            line: optional(&self.line),
            origin: optional(&self.origin),
            destination: optional(&self.destination),
        })
    }
}

/// Seed files occasionally ship geometry without a summary; recompute the
/// distance from the coordinates so the cost figures stay meaningful.
fn normalize_snapshot(mut snapshot: LaneSnapshot) -> LaneSnapshot {
    if snapshot.route_data.total_distance <= 0.0 {
        snapshot.route_data.total_distance =
            geometry::path_distance_m(&snapshot.route_data.coordinates);
    }
    snapshot
}

/// Applies a routing outcome to the registry. A failure leaves the registry
/// untouched; only a successful snapshot creates a lane.
fn apply_lane_result(
    registry: &mut LaneRegistry,
    result: Result<LaneSnapshot, String>,
) -> Result<LaneId, String> {
    let snapshot = normalize_snapshot(result?);
    Ok(registry.add_lane(snapshot))
}

pub enum Msg {
    LineChanged(String),
    OriginChanged(String),
    DestinationChanged(String),
    ServiceCodeChanged(String),
    LoadCodeChanged(String),
    MapClicked { lat: f64, lng: f64 },
    ClearWaypoints,
    Submit,
    LaneReady(Result<LaneSnapshot, String>),
    AddMarker(LaneId, PropulsionType),
    RemoveMarker(LaneId, PropulsionType),
    ClearLaneMarkers(LaneId),
    ClearAllLanes,
    SaveLane(LaneId),
    LaneSaved(Result<(), String>),
    LoadCachedLane,
    LoadSeedLane,
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("map-click"), |event| {
        let event = event
            .dyn_into::<web_sys::CustomEvent>()
            .expect("map-click event must be CustomEvent");
        let payload: MapClickPayload = serde_wasm_bindgen::from_value(event.detail())
            .unwrap_or(MapClickPayload { lat: 0.0, lng: 0.0 });
        Msg::MapClicked {
            lat: payload.lat,
            lng: payload.lng,
        }
    }));

    Model {
        form: LaneForm::default(),
        waypoints: Vec::new(),
        registry: LaneRegistry::new(),
        pending: false,
        error: None,
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::LineChanged(val) => model.form.line = val,
        Msg::OriginChanged(val) => model.form.origin = val,
        Msg::DestinationChanged(val) => model.form.destination = val,
        Msg::ServiceCodeChanged(val) => model.form.service_code = val,
        Msg::LoadCodeChanged(val) => model.form.load_code = val,
        Msg::MapClicked { lat, lng } => {
            model.waypoints.push(Coordinate { lat, lng });
            add_waypoint_marker(lat, lng);
        }
        Msg::ClearWaypoints => {
            model.waypoints.clear();
            clear_waypoint_markers();
        }
        Msg::Submit => {
            // One routing request at a time: the directions callbacks would
            // otherwise race on the registry.
            if model.pending {
                return;
            }
            match model.form.to_request(&model.waypoints) {
                Ok(payload) => {
                    model.pending = true;
                    model.error = None;
                    orders.perform_cmd(send_route_request(payload));
                }
                Err(err) => model.error = Some(err),
            }
        }
        Msg::LaneReady(result) => {
            model.pending = false;
            // Registry insert and layer updates happen together in this one
            // step, so no other event can observe a half-added lane.
            match apply_lane_result(&mut model.registry, result) {
                Ok(id) => {
                    let lane = model.registry.lane(id).expect("lane just added");
                    if let Ok(coords) = to_value(&lane.route.coordinates) {
                        draw_lane_polyline(&id.to_string(), coords);
                    }
                    if let Ok(coords) = to_value(&lane.route.coordinates) {
                        fit_lane_bounds(coords);
                    }
                    model.waypoints.clear();
                    clear_waypoint_markers();
                    model.error = None;
                }
                Err(err) => {
                    web_sys::console::error_1(
                        &format!("An error occured while routing: {err}").into(),
                    );
                    model.error = Some(err);
                }
            }
        }
        Msg::AddMarker(id, ptype) => {
            if let Some(lane) = model.registry.lane_mut(id) {
                match lane.add_marker(ptype) {
                    Some(placement) => place_bus_marker(
                        &layer_key(id, &placement.id),
                        &placement.id.css_class(),
                        placement.position.lat,
                        placement.position.lng,
                        placement.color,
                    ),
                    None => model.error = Some("Lane has no geometry to anchor to".into()),
                }
            }
        }
        Msg::RemoveMarker(id, ptype) => {
            if let Some(lane) = model.registry.lane_mut(id) {
                if let Some(marker) = lane.pop_marker(ptype) {
                    remove_bus_marker(&layer_key(id, &marker));
                }
            }
        }
        Msg::ClearLaneMarkers(id) => {
            if let Some(lane) = model.registry.lane_mut(id) {
                for marker in lane.remove_all_markers() {
                    remove_bus_marker(&layer_key(id, &marker));
                }
            }
        }
        Msg::ClearAllLanes => {
            model.registry.remove_all_lanes();
            model.waypoints.clear();
            clear_map_layers();
        }
        Msg::SaveLane(id) => {
            if let Some(lane) = model.registry.lane(id) {
                orders.perform_cmd(save_lane_request(lane.snapshot()));
            }
        }
        Msg::LaneSaved(result) => {
            if let Err(err) = result {
                web_sys::console::error_1(&format!("Failed to save lane: {err}").into());
                model.error = Some(err);
            } else {
                web_sys::console::log_1(&"Lane saved to the route cache".into());
            }
        }
        Msg::LoadCachedLane => {
            let code = model.form.load_code.trim().to_string();
            if code.is_empty() {
                model.error = Some("Enter a service code to load".into());
                return;
            }
            orders.perform_cmd(async move {
                Msg::LaneReady(fetch_lane(format!("{}/api/lanes/{code}", api_root())).await)
            });
        }
        Msg::LoadSeedLane => {
            let code = model.form.load_code.trim().to_string();
            if code.is_empty() {
                model.error = Some("Enter a service code to load".into());
                return;
            }
            orders.perform_cmd(async move {
                Msg::LaneReady(fetch_lane(format!("{}/route-data/{code}.json", api_root())).await)
            });
        }
    }
}

async fn send_route_request(payload: RouteRequest) -> Msg {
    web_sys::console::debug_1(
        &format!(
            "[frontend] routing {} waypoints for service {}",
            payload.waypoints.len(),
            payload.service_code
        )
        .into(),
    );
    let response = match Request::new(format!("{}/api/route", api_root()))
        .method(Method::Post)
        .json(&payload)
    {
        Err(err) => Err(format!("{err:?}")),
        Ok(request) => match request.fetch().await {
            Err(err) => Err(format!("{err:?}")),
            Ok(raw) => match raw.check_status() {
                Err(status_err) => Err(format!("{status_err:?}")),
                Ok(resp) => match resp.json::<LaneSnapshot>().await {
                    Ok(snapshot) => Ok(snapshot),
                    Err(err) => Err(format!("{err:?}")),
                },
            },
        },
    };

    Msg::LaneReady(response)
}

async fn fetch_lane(url: String) -> Result<LaneSnapshot, String> {
    let request = Request::new(url).method(Method::Get);
    match request.fetch().await {
        Err(err) => Err(format!("Failed to fetch: {err:?}")),
        Ok(raw) => match raw.check_status() {
            Err(status_err) => Err(format!("Status error: {status_err:?}")),
            Ok(resp) => match resp.json::<LaneSnapshot>().await {
                Ok(snapshot) => Ok(snapshot),
                Err(err) => Err(format!("Failed to parse JSON: {err:?}")),
            },
        },
    }
}

async fn save_lane_request(snapshot: LaneSnapshot) -> Msg {
    let url = format!("{}/api/lanes/{}", api_root(), snapshot.service_code);
    let result = match Request::new(url).method(Method::Put).json(&snapshot) {
        Err(err) => Err(format!("{err:?}")),
        Ok(request) => match request.fetch().await {
            Err(err) => Err(format!("{err:?}")),
            Ok(raw) => raw.check_status().map(|_| ()).map_err(|e| format!("{e:?}")),
        },
    };
    Msg::LaneSaved(result)
}

pub fn view(model: &Model) -> Node<Msg> {
    let header = h1!["Bus lane visualizer"];
    let form = view_form(model);
    let lanes = view_lanes(model);

    div![C!["app-container"], header, form, lanes]
}

fn view_form(model: &Model) -> Node<Msg> {
    let input_field = |label: &str, value: &str, msg: fn(String) -> Msg| {
        div![
            C!["input-field"],
            label![label],
            input![
                attrs! {
                    At::Value => value,
                    At::AutoComplete => "off",
                    At::SpellCheck => "false",
                },
                input_ev(Ev::Input, msg),
            ]
        ]
    };

    form![
        C!["controls"],
        fieldset![
            legend!["Service"],
            input_field("Line", &model.form.line, Msg::LineChanged),
            input_field("Origin", &model.form.origin, Msg::OriginChanged),
            input_field("Destination", &model.form.destination, Msg::DestinationChanged),
            input_field("Service code", &model.form.service_code, Msg::ServiceCodeChanged),
        ],
        fieldset![
            legend!["Waypoints"],
            p![format!("{} waypoint(s) collected", model.waypoints.len())],
            small!["Click the map to append a waypoint."],
            button![
                "Clear waypoints",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::ClearWaypoints
                }),
            ],
        ],
        fieldset![
            legend!["Load a lane"],
            input_field("Service code", &model.form.load_code, Msg::LoadCodeChanged),
            button![
                "Load cached",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::LoadCachedLane
                }),
            ],
            button![
                "Load seed data",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::LoadSeedLane
                }),
            ],
        ],
        button![
            "Find route",
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::Submit
            }),
            attrs! { At::Disabled => bool_attr(model.pending) },
        ],
        button![
            "Clear all lanes",
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::ClearAllLanes
            }),
        ],
        if let Some(error) = &model.error {
            p![C!["error"], error]
        } else {
            empty![]
        }
    ]
}

fn view_lanes(model: &Model) -> Node<Msg> {
    if model.registry.is_empty() {
        return div![
            C!["lanes"],
            h2!["No lanes yet"],
            p!["Collect waypoints and find a route to add a lane."]
        ];
    }

    let lanes = model.registry.lanes().iter().map(|lane| {
        let id = lane.id;
        let distance_m = lane.route.total_distance;

        let type_rows = PropulsionType::ALL.into_iter().map(|ptype| {
            div![
                C!["marker-row"],
                span![
                    style! { St::Color => ptype.color() },
                    format!("{ptype}: {}", lane.marker_count(ptype)),
                ],
                button![
                    "+",
                    ev(Ev::Click, move |event| {
                        event.prevent_default();
                        Msg::AddMarker(id, ptype)
                    }),
                ],
                button![
                    "−",
                    ev(Ev::Click, move |event| {
                        event.prevent_default();
                        Msg::RemoveMarker(id, ptype)
                    }),
                ],
                span![format!(
                    "£{:.2} / {:.1} kg CO2e",
                    costing::cost(ptype, distance_m),
                    costing::emission(ptype, distance_m),
                )],
            ]
        });

        div![
            C!["lane-card"],
            h3![lane.label()],
            p![format!(
                "{} · {:.2} km, {:.0} min",
                lane.service_code,
                distance_m / 1000.0,
                lane.route.total_time / 60.0,
            )],
            type_rows.collect::<Vec<_>>(),
            button![
                "Clear markers",
                ev(Ev::Click, move |event| {
                    event.prevent_default();
                    Msg::ClearLaneMarkers(id)
                }),
            ],
            button![
                "Save to cache",
                ev(Ev::Click, move |event| {
                    event.prevent_default();
                    Msg::SaveLane(id)
                }),
            ],
        ]
    });

    div![C!["lanes"], h2!["Lanes"], lanes.collect::<Vec<_>>()]
}

#[wasm_bindgen(start)]
pub fn start() {
    init_map();
    App::start("app", init, update, view);
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}

#[derive(Deserialize)]
struct MapClickPayload {
    lat: f64,
    lng: f64,
}
