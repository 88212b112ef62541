//! Opaque JS template constants injected by the stealth patcher. Content is
//! intentionally outside the type system — these are byte blobs passed to
//! `Page.addScriptToEvaluateOnNewDocument`.

/// Replaces `window.chrome` with an object shaped like the one a real
/// Chrome build exposes, rather than simply deleting it.
pub const HIDE_CHROME: &str = r#"const d=Object.defineProperty,c=window.chrome||{};function np(){return{}}const fns={app:{get:np},csi:function csi(){},loadTimes:function loadTimes(){},getVariableValue:function getVariableValue(){},send:function send(){}};for(const[k,v]of Object.entries(fns))'get'in v?d(c,k,{get:v.get,enumerable:!0,configurable:!0}):(v.toString=()=>`function ${k}() { [native code] }`,d(c,k,{value:v,enumerable:!0,configurable:!0}));d(c,'runtime',{get:np,set:np,enumerable:!0,configurable:!0});d(window,'chrome',{value:c,writable:!0,enumerable:!0});"#;

/// Removes `navigator.webdriver` while keeping `Function.prototype.toString`
/// reporting the getter as native code, defeating the most common
/// `toString`-based detection of an overridden getter.
pub const HIDE_WEBDRIVER: &str = r#"const r=Function.prototype.toString,g=()=>false;Function.prototype.toString=function(){return this===g?'function get webdriver() { [native code] }':r.call(this)};Object.defineProperty(Navigator.prototype,'webdriver',{get:g,enumerable:false,configurable:true});"#;

/// Adds `navigator.pdfViewerEnabled`, present on real Chrome but absent on a
/// freshly launched headless instance.
pub const NAVIGATOR_SCRIPT: &str = r#"const nativeGet=new Function("return true");Object.defineProperty(nativeGet,'toString',{value:()=>"function get pdfViewerEnabled() { [native code] }"});Object.defineProperty(Navigator.prototype,"pdfViewerEnabled",{get:nativeGet,configurable:!0});"#;

/// Populates `navigator.plugins`/`navigator.mimeTypes` with the built-in PDF
/// viewer entries real Chrome reports.
pub const PLUGIN_AND_MIMETYPE_SPOOF: &str = r#"const m=[{type:'application/pdf',suffixes:'pdf',description:'Portable Document Format'},{type:'text/pdf',suffixes:'pdf',description:'Portable Document Format'}],names=['PDF Viewer','Chrome PDF Viewer','Chromium PDF Viewer'],plugins=[],mimes=[];names.forEach(name=>{const plugin=Object.create(Plugin.prototype);Object.defineProperties(plugin,{name:{value:name},description:{value:'Portable Document Format'},filename:{value:'internal-pdf-viewer'},length:{value:2}});const mt1=Object.create(MimeType.prototype),mt2=Object.create(MimeType.prototype);Object.defineProperties(mt1,{type:{value:m[0].type},suffixes:{value:m[0].suffixes},description:{value:m[0].description},enabledPlugin:{value:plugin}});Object.defineProperties(mt2,{type:{value:m[1].type},suffixes:{value:m[1].suffixes},description:{value:m[1].description},enabledPlugin:{value:plugin}});plugin[0]=mt1;plugin[1]=mt2;mimes.push(mt1,mt2);plugins.push(plugin)});const pa=Object.create(PluginArray.prototype),ma=Object.create(MimeTypeArray.prototype);plugins.forEach((p,i)=>{Object.defineProperty(pa,i,{value:p,enumerable:true})});Object.defineProperty(pa,'length',{value:plugins.length,enumerable:false});mimes.forEach((mt,i)=>{Object.defineProperty(ma,i,{value:mt,enumerable:true})});Object.defineProperty(ma,'length',{value:mimes.length,enumerable:false});const g=(v,n)=>{const f=()=>v;Object.defineProperty(f,'toString',{value:()=>`function get ${n}() { [native code] }`});return f};Object.defineProperties(Navigator.prototype,{plugins:{get:g(pa,'plugins')},mimeTypes:{get:g(ma,'mimeTypes')}});"#;

/// Permission-query spoof: most permissions are granted, a handful the
/// real Chrome always asks about stay `prompt`, matching a never-interacted
/// profile rather than one that has already granted everything.
pub const SPOOF_PERMISSIONS_QUERY: &str = r#"const map={accelerometer:"granted","background-fetch":"granted","background-sync":"granted",gyroscope:"granted",magnetometer:"granted","screen-wake-lock":"granted",camera:"prompt","display-capture":"prompt",geolocation:"prompt",microphone:"prompt",midi:"prompt",notifications:"prompt","persistent-storage":"prompt"};const native=navigator.permissions.query.bind(navigator.permissions);Object.defineProperty(navigator.permissions,"query",{value:function(p){if(p&&p.name&&map.hasOwnProperty(p.name)){return Promise.resolve(Object.setPrototypeOf({state:map[p.name],onchange:null},PermissionStatus.prototype))}return native(p)},configurable:true});"#;

/// Adds deterministic per-pixel noise to `CanvasRenderingContext2D.getImageData`
/// and `HTMLCanvasElement.toDataURL`, seeded so the same profile always
/// produces the same (still noisy) output.
pub fn canvas_noise_script(seed: u64) -> String {
    format!(
        r#"(()=>{{let s={seed}>>>0;const rnd=()=>{{s^=s<<13;s^=s>>>17;s^=s<<5;s>>>=0;return(s%7)-3}};const gi=CanvasRenderingContext2D.prototype.getImageData;Object.defineProperty(CanvasRenderingContext2D.prototype,'getImageData',{{value:function(...a){{const d=gi.apply(this,a);for(let i=0;i<d.data.length;i+=4){{d.data[i]=Math.min(255,Math.max(0,d.data[i]+rnd()))}}return d}},configurable:true}});const td=HTMLCanvasElement.prototype.toDataURL;Object.defineProperty(HTMLCanvasElement.prototype,'toDataURL',{{value:function(...a){{const ctx=this.getContext('2d');if(ctx){{try{{ctx.getImageData(0,0,1,1)}}catch(e){{}}}}return td.apply(this,a)}},configurable:true}});}})();"#,
        seed = seed
    )
}

/// Adds bounded noise to `AudioBuffer.getChannelData`, seeded the same way
/// as the canvas noise so a profile presents one consistent identity across
/// both fingerprinting vectors.
pub fn audio_noise_script(seed: u64) -> String {
    format!(
        r#"(()=>{{let s={seed}>>>0||1;const rnd=()=>{{s^=s<<13;s^=s>>>17;s^=s<<5;s>>>=0;return(s/4294967295)*2e-7-1e-7}};const gcd=AudioBuffer.prototype.getChannelData;Object.defineProperty(AudioBuffer.prototype,'getChannelData',{{value:function(...a){{const d=gcd.apply(this,a);for(let i=0;i<d.length;i++){{d[i]+=rnd()}}return d}},configurable:true}});}})();"#,
        seed = seed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_scripts_are_deterministic_for_a_seed() {
        assert_eq!(canvas_noise_script(42), canvas_noise_script(42));
        assert_ne!(canvas_noise_script(42), canvas_noise_script(7));
    }
}
