use anyhow::{Context, Result};

use crate::fetch::RegionFailure;
use crate::processing::FilterSubstrings;
use crate::types::Marker;

/// The page shell, bundled in the binary. Server-derived data enters
/// only through the three placeholders, as strict JSON or a prebuilt
/// fragment.
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Bank ATMs Map</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet/dist/leaflet.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster/dist/MarkerCluster.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster/dist/MarkerCluster.Default.css" />
    <link rel="stylesheet" href="static/style.css" />
    <style>
        #map {
            height: 500px;
        }

        .checkbox-group {
            margin-bottom: 10px;
        }

        .checkbox-group label {
            margin-right: 15px;
        }

        .degraded-banner {
            padding: 8px 12px;
            margin-bottom: 10px;
            background: #fff3cd;
            border: 1px solid #ffe69c;
            color: #664d03;
        }
    </style>
</head>
<body>
    __DEGRADED__
    <div id="map"></div>

    <div class="checkbox-group">
        <label><input type="checkbox" id="currency-checkbox"> Выдаваемая валюта BYN</label>
        <label><input type="checkbox" id="twenty-four-seven-checkbox"> Работает 24/7</label>
        <label><input type="checkbox" id="error-checkbox"> Неисправность банкомата</label>
        <label><input type="checkbox" id="cash-in-checkbox"> Наличие купюроприемника</label>
    </div>

    <script src="https://unpkg.com/leaflet/dist/leaflet.js"></script>
    <script src="https://unpkg.com/leaflet.markercluster/dist/leaflet.markercluster.js"></script>

    <script>
        var markers = __MARKERS__;
        var filters = __FILTERS__;

        function initMap() {
            var map = L.map('map').setView([53.9045, 27.5615], 6);

            L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
                attribution: '© OpenStreetMap contributors'
            }).addTo(map);

            var markersCluster = L.markerClusterGroup();

            for (var i = 0; i < markers.length; i++) {
                var marker = L.marker([markers[i].lat, markers[i].lng]);
                marker.bindPopup(markers[i].popup);
                markersCluster.addLayer(marker);
            }

            map.addLayer(markersCluster);

            var conditions = [
                ['currency-checkbox', filters.currency],
                ['twenty-four-seven-checkbox', filters.roundClock],
                ['error-checkbox', filters.fault],
                ['cash-in-checkbox', filters.cashIn]
            ];

            // A marker stays visible if it matches ANY checked filter;
            // with nothing checked the visible set is empty.
            function filterMarkers() {
                markersCluster.clearLayers();

                for (var i = 0; i < markers.length; i++) {
                    var visible = conditions.some(function (condition) {
                        return document.getElementById(condition[0]).checked
                            && markers[i].popup.includes(condition[1]);
                    });
                    if (visible) {
                        var marker = L.marker([markers[i].lat, markers[i].lng]);
                        marker.bindPopup(markers[i].popup);
                        markersCluster.addLayer(marker);
                    }
                }
            }

            conditions.forEach(function (condition) {
                document.getElementById(condition[0]).addEventListener('change', filterMarkers);
            });
        }
        initMap();
    </script>
</body>
</html>
"#;

pub fn render_page(
    markers: &[Marker],
    filters: &FilterSubstrings,
    failures: &[RegionFailure],
) -> Result<String> {
    let markers_json =
        script_safe(&serde_json::to_string(markers).context("Failed to serialize markers")?);
    let filters_json =
        script_safe(&serde_json::to_string(filters).context("Failed to serialize filters")?);

    Ok(PAGE_TEMPLATE
        .replace("__MARKERS__", &markers_json)
        .replace("__FILTERS__", &filters_json)
        .replace("__DEGRADED__", &degraded_banner(failures)))
}

/// `</script>` inside a JSON string literal would terminate the inline
/// script block; `\/` is a legal JSON escape, so break every `</`.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn degraded_banner(failures: &[RegionFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let regions = failures
        .iter()
        .map(|f| escape_html(&f.region))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "<div class=\"degraded-banner\">Данные неполные: не удалось загрузить регионы: {regions}</div>"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingConfig;
    use crate::processing::filter_substrings;

    fn marker(popup: &str) -> Marker {
        Marker {
            lat: 53.9,
            lng: 27.5,
            popup: popup.to_string(),
        }
    }

    #[test]
    fn page_embeds_markers_and_controls() {
        let markers = vec![marker("<b>Отделение</b>")];
        let filters = filter_substrings(&ProcessingConfig::default());
        let page = render_page(&markers, &filters, &[]).unwrap();

        assert!(page.contains(r#""lat":53.9"#));
        assert!(page.contains("Отделение"));
        for id in [
            "currency-checkbox",
            "twenty-four-seven-checkbox",
            "error-checkbox",
            "cash-in-checkbox",
        ] {
            assert!(page.contains(id), "missing checkbox id {id}");
        }
        assert!(page.contains("markerClusterGroup"));
        assert!(!page.contains("degraded-banner\">"));
    }

    #[test]
    fn banner_appears_only_with_failures() {
        let filters = filter_substrings(&ProcessingConfig::default());
        let failures = vec![RegionFailure {
            region: "Минская область".to_string(),
            error: "request failed".to_string(),
        }];
        let page = render_page(&[], &filters, &failures).unwrap();
        assert!(page.contains("Данные неполные"));
        assert!(page.contains("Минская область"));
    }

    #[test]
    fn script_closing_tags_in_popups_are_defused() {
        let markers = vec![marker("</script><script>alert(1)</script>")];
        let filters = filter_substrings(&ProcessingConfig::default());
        let page = render_page(&markers, &filters, &[]).unwrap();
        assert!(!page.contains("popup\":\"</script>"));
        assert!(page.contains("<\\/script>"));
    }

    #[test]
    fn no_placeholders_survive_rendering() {
        let filters = filter_substrings(&ProcessingConfig::default());
        let page = render_page(&[], &filters, &[]).unwrap();
        for placeholder in ["__MARKERS__", "__FILTERS__", "__DEGRADED__"] {
            assert!(!page.contains(placeholder));
        }
    }
}
